// ── Record-to-entity conversions ──
//
// Builds the `model` types from raw (or reshaped) records. Each builder
// takes the keys it knows out of the record, parses them into strong types,
// and leaves whatever remains in the entity's `extra` bag.
//
// The server uses two date encodings: specs (`user -o`, `client -o`,
// `change -o`) print `YYYY/MM/DD hh:mm:ss`, listings print Unix seconds.
// The parser is chosen per field.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use p4kit_api::{MessageLevel, Record};
use regex::Regex;

use crate::error::CoreError;
use crate::model::{
    ActionMessage, ActionResult, ChangeRef, Changelist, ChangelistSummary, FileRevision, FileStat,
    HeadRevisionInfo, OpenedFile, OtherOpenEntry, SyncResult, User, View, Workspace,
    WorkspaceOptions,
};
use crate::reshape::{extract_indexed_list, take_indexed_groups};

/// Date format of spec forms.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

static OTHER_OPEN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(otherOpen|otherAction|otherChange)([0-9]+)$")
        .expect("other-open key regex is valid")
});

// ── Helpers ────────────────────────────────────────────────────────

/// Parse a spec-form date, always UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a Unix timestamp in seconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// `default` or a changelist number.
pub fn parse_change_ref(raw: &str) -> Option<ChangeRef> {
    match raw.trim() {
        "default" => Some(ChangeRef::Default),
        n => n.parse().ok().map(ChangeRef::Number),
    }
}

/// Split a view line into its two sides, honoring double quotes.
pub fn parse_view(line: &str) -> Result<View, CoreError> {
    let tokens = split_quoted(line)
        .ok_or_else(|| CoreError::validation("View", "View", format!("unbalanced quotes in '{line}'")))?;
    match <[String; 2]>::try_from(tokens) {
        Ok([depot, workspace]) => Ok(View { depot, workspace }),
        Err(tokens) => Err(CoreError::validation(
            "View",
            "View",
            format!("expected 2 paths, found {} in '{line}'", tokens.len()),
        )),
    }
}

/// Whitespace split where `"..."` groups a token. `None` on an unclosed
/// quote.
fn split_quoted(line: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quoted {
        return None;
    }
    if in_token {
        tokens.push(current);
    }
    Some(tokens)
}

/// Takes typed fields out of a record on behalf of one entity.
struct Fields {
    entity: &'static str,
    record: Record,
}

impl Fields {
    fn new(entity: &'static str, mut record: Record) -> Self {
        record.shift_remove("code");
        Self { entity, record }
    }

    fn optional(&mut self, key: &str) -> Option<String> {
        self.record.shift_remove(key)
    }

    fn required(&mut self, key: &str) -> Result<String, CoreError> {
        self.optional(key)
            .ok_or_else(|| CoreError::validation(self.entity, key, "missing"))
    }

    fn parsed<T, F>(&self, key: &str, raw: &str, parse: F) -> Result<T, CoreError>
    where
        F: FnOnce(&str) -> Option<T>,
    {
        parse(raw).ok_or_else(|| CoreError::validation(self.entity, key, format!("unexpected value '{raw}'")))
    }

    fn number<T: FromStr>(&mut self, key: &str) -> Result<T, CoreError> {
        let raw = self.required(key)?;
        self.parsed(key, &raw, |s| s.trim().parse().ok())
    }

    fn optional_number<T: FromStr>(&mut self, key: &str) -> Result<Option<T>, CoreError> {
        match self.optional(key) {
            Some(raw) => self.parsed(key, &raw, |s| s.trim().parse().ok()).map(Some),
            None => Ok(None),
        }
    }

    /// Enumerated field. Values outside the known set are rejected.
    fn enumeration<T: FromStr>(&mut self, key: &str) -> Result<T, CoreError> {
        let raw = self.required(key)?;
        self.parsed(key, &raw, |s| s.parse().ok())
    }

    fn optional_enumeration<T: FromStr>(&mut self, key: &str) -> Result<Option<T>, CoreError> {
        match self.optional(key) {
            Some(raw) => self.parsed(key, &raw, |s| s.parse().ok()).map(Some),
            None => Ok(None),
        }
    }

    fn date(&mut self, key: &str) -> Result<DateTime<Utc>, CoreError> {
        let raw = self.required(key)?;
        self.parsed(key, &raw, parse_date)
    }

    fn optional_date(&mut self, key: &str) -> Result<Option<DateTime<Utc>>, CoreError> {
        match self.optional(key) {
            Some(raw) => self.parsed(key, &raw, parse_date).map(Some),
            None => Ok(None),
        }
    }

    fn timestamp(&mut self, key: &str) -> Result<DateTime<Utc>, CoreError> {
        let raw = self.required(key)?;
        self.parsed(key, &raw, parse_timestamp)
    }

    fn change_ref(&mut self, key: &str) -> Result<ChangeRef, CoreError> {
        let raw = self.required(key)?;
        self.parsed(key, &raw, parse_change_ref)
    }

    /// Whatever was not taken.
    fn finish(self) -> Record {
        self.record
    }
}

// ── User ───────────────────────────────────────────────────────────

/// Build a [`User`] from `user -o` output (spec-form dates).
pub fn user_from_spec(record: Record) -> Result<User, CoreError> {
    build_user(record, Fields::date)
}

/// Build a [`User`] from one `users` line (Unix timestamps).
pub fn user_from_listing(record: Record) -> Result<User, CoreError> {
    build_user(record, Fields::timestamp)
}

fn build_user(
    record: Record,
    date: fn(&mut Fields, &str) -> Result<DateTime<Utc>, CoreError>,
) -> Result<User, CoreError> {
    let mut f = Fields::new("User", record);
    Ok(User {
        name: f.required("User")?,
        email: f.required("Email")?,
        full_name: f.required("FullName")?,
        user_type: f.enumeration("Type")?,
        auth_method: f.optional_enumeration("AuthMethod")?,
        access: date(&mut f, "Access")?,
        update: date(&mut f, "Update")?,
        extra: f.finish(),
    })
}

// ── Workspace ──────────────────────────────────────────────────────

impl TryFrom<Record> for Workspace {
    type Error = CoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("Workspace", record);
        let views = extract_indexed_list(&mut f.record, "View")
            .iter()
            .map(String::as_str)
            .map(parse_view)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Workspace {
            name: f.required("Client")?,
            owner: f.required("Owner")?,
            host: f.optional("Host").unwrap_or_default(),
            description: f.required("Description")?,
            root: f.required("Root")?.into(),
            options: WorkspaceOptions::parse(&f.required("Options")?),
            submit_options: f.enumeration("SubmitOptions")?,
            workspace_type: f.enumeration("Type")?,
            stream: f.optional("Stream").filter(|s| !s.is_empty()),
            access: f.date("Access")?,
            update: f.date("Update")?,
            views,
            extra: f.finish(),
        })
    }
}

// ── Changelists ────────────────────────────────────────────────────

impl TryFrom<Record> for Changelist {
    type Error = CoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("Changelist", record);
        let files = extract_indexed_list(&mut f.record, "Files");

        let raw_change = f.required("Change")?;
        let change = match raw_change.trim() {
            "new" => None,
            n => Some(f.parsed("Change", n, |s| s.parse().ok())?),
        };

        Ok(Changelist {
            change,
            client: f.required("Client")?,
            user: f.required("User")?,
            date: f.optional_date("Date")?,
            description: f.required("Description")?,
            status: f.enumeration("Status")?,
            change_type: f.enumeration("Type")?,
            files,
            shelve_access: f.optional_date("shelveAccess")?,
            shelve_update: f.optional_date("shelveUpdate")?,
            extra: f.finish(),
        })
    }
}

impl TryFrom<Record> for ChangelistSummary {
    type Error = CoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("ChangelistSummary", record);
        Ok(ChangelistSummary {
            change: f.number("change")?,
            client: f.required("client")?,
            user: f.required("user")?,
            date: f.timestamp("time")?,
            description: f.required("desc")?,
            status: f.enumeration("status")?,
            change_type: f.enumeration("changeType")?,
            extra: f.finish(),
        })
    }
}

// ── File actions ───────────────────────────────────────────────────

impl TryFrom<Record> for ActionMessage {
    type Error = CoreError;

    /// Split `data` on the last ` - ` into path and message.
    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("ActionMessage", record);
        let data = f.optional("data").unwrap_or_default();
        let (path, message) = data.rsplit_once(" - ").unwrap_or(("", data.as_str()));

        let level = match f.optional("level") {
            Some(raw) => f.parsed("level", &raw, |s| {
                s.trim().parse().ok().and_then(MessageLevel::from_code)
            })?,
            None => MessageLevel::None,
        };

        Ok(ActionMessage {
            path: path.trim().to_owned(),
            message: message.trim().to_owned(),
            level,
        })
    }
}

impl TryFrom<Record> for ActionResult {
    type Error = CoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("ActionResult", record);
        Ok(ActionResult {
            action: f.required("action")?,
            client_file: f.required("clientFile")?,
            depot_file: f.required("depotFile")?,
            file_type: f.optional("type"),
            work_rev: f.optional_number("workRev")?,
            extra: f.finish(),
        })
    }
}

// ── Revisions ──────────────────────────────────────────────────────

impl TryFrom<Record> for FileRevision {
    type Error = CoreError;

    /// Expects one group produced by the revision-key reshape: `rev`,
    /// `change`, `action`, ... plus the shared `depotFile`.
    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("FileRevision", record);
        Ok(FileRevision {
            action: f.enumeration("action")?,
            change: f.number("change")?,
            client: f.required("client")?,
            depot_file: f.required("depotFile")?,
            description: f.required("desc")?,
            digest: f.optional("digest"),
            file_size: f.optional_number("fileSize")?,
            revision: f.number("rev")?,
            time: f.timestamp("time")?,
            file_type: f.required("type")?,
            user: f.required("user")?,
            extra: f.finish(),
        })
    }
}

// ── Sync ───────────────────────────────────────────────────────────

impl TryFrom<Record> for SyncResult {
    type Error = CoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("SyncResult", record);
        Ok(SyncResult {
            action: f.required("action")?,
            client_file: f.required("clientFile")?,
            depot_file: f.required("depotFile")?,
            revision: f.number("rev")?,
            file_size: f.optional_number("fileSize")?,
            extra: f.finish(),
        })
    }
}

// ── Fstat ──────────────────────────────────────────────────────────

impl TryFrom<Record> for FileStat {
    type Error = CoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("FileStat", record);

        let head = if f.record.contains_key("headRev") {
            Some(HeadRevisionInfo {
                action: f.enumeration("headAction")?,
                change: f.number("headChange")?,
                revision: f.number("headRev")?,
                file_type: f.required("headType")?,
                time: f.timestamp("headTime")?,
                mod_time: f.timestamp("headModTime")?,
                charset: f.optional("headCharset").filter(|c| !c.is_empty()),
            })
        } else {
            None
        };

        // Present with an empty value when mapped.
        let is_mapped = f.optional("isMapped").is_some_and(|v| v.is_empty());

        Ok(FileStat {
            client_file: f.required("clientFile")?,
            depot_file: f.required("depotFile")?,
            head,
            have_rev: f.optional_number("haveRev")?,
            is_mapped,
            others_open: others_open(&mut f)?,
            extra: f.finish(),
        })
    }
}

/// `otherOpen` holds the count; `otherOpen{i}` is `user@client`.
fn others_open(f: &mut Fields) -> Result<Vec<OtherOpenEntry>, CoreError> {
    let Some(count) = f.optional_number::<usize>("otherOpen")? else {
        return Ok(Vec::new());
    };

    let mut groups = take_indexed_groups(&mut f.record, &OTHER_OPEN_KEY);
    let mut entries = Vec::with_capacity(count);
    for index in 0..count {
        let mut g = Fields::new("OtherOpenEntry", groups.shift_remove(&index).unwrap_or_default());
        let holder = g.required("otherOpen")?;
        let (user, client) = holder.split_once('@').unwrap_or((holder.as_str(), ""));
        entries.push(OtherOpenEntry {
            action: g.enumeration("otherAction")?,
            change: g.change_ref("otherChange")?,
            user: user.to_owned(),
            client: client.to_owned(),
        });
    }

    // Indices past the count go back to `extra` under their wire names.
    for (index, group) in groups {
        for (name, value) in group {
            f.record.insert(format!("{name}{index}"), value);
        }
    }
    Ok(entries)
}

// ── Opened ─────────────────────────────────────────────────────────

impl TryFrom<Record> for OpenedFile {
    type Error = CoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let mut f = Fields::new("OpenedFile", record);
        Ok(OpenedFile {
            depot_file: f.required("depotFile")?,
            client_file: f.optional("clientFile"),
            revision: f.number("rev")?,
            have_rev: f.optional_number("haveRev")?,
            action: f.enumeration("action")?,
            change: f.change_ref("change")?,
            file_type: f.required("type")?,
            user: f.required("user")?,
            client: f.required("client")?,
            extra: f.finish(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{
        AuthMethod, ChangeStatus, ChangeType, FileAction, SubmitOptions, UserType, WorkspaceType,
    };
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn user_spec() -> Record {
        record(&[
            ("code", "stat"),
            ("User", "alice"),
            ("Type", "standard"),
            ("Email", "alice@example.com"),
            ("Update", "2024/01/01 00:00:00"),
            ("Access", "2024/03/05 12:30:01"),
            ("FullName", "Alice Liddell"),
            ("AuthMethod", "perforce"),
            ("Reviews0", "//depot/alice/..."),
        ])
    }

    // ── Dates ───────────────────────────────────────────────────────

    #[test]
    fn spec_dates_are_utc() {
        assert_eq!(parse_date("2024/03/05 12:30:01"), Some(utc(2024, 3, 5, 12, 30, 1)));
        assert_eq!(parse_date("1709641801"), None);
    }

    #[test]
    fn timestamps_are_unix_seconds() {
        assert_eq!(parse_timestamp("1709641801"), Some(utc(2024, 3, 5, 12, 30, 1)));
        assert_eq!(parse_timestamp("2024/03/05"), None);
    }

    // ── User ────────────────────────────────────────────────────────

    #[test]
    fn user_from_spec_record() {
        let user = user_from_spec(user_spec()).unwrap();
        assert_eq!(user.name, "alice");
        assert_eq!(user.full_name, "Alice Liddell");
        assert_eq!(user.user_type, UserType::Standard);
        assert_eq!(user.auth_method, Some(AuthMethod::Perforce));
        assert_eq!(user.update, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(user.extra, record(&[("Reviews0", "//depot/alice/...")]));
    }

    #[test]
    fn building_twice_yields_equal_entities() {
        let raw = user_spec();
        assert_eq!(user_from_spec(raw.clone()).unwrap(), user_from_spec(raw).unwrap());
    }

    #[test]
    fn user_from_listing_reads_timestamps() {
        let raw = record(&[
            ("code", "stat"),
            ("User", "bob"),
            ("Email", "bob@example.com"),
            ("Update", "1704067200"),
            ("Access", "1709641801"),
            ("FullName", "Bob"),
            ("Type", "service"),
        ]);
        let user = user_from_listing(raw).unwrap();
        assert_eq!(user.update, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(user.user_type, UserType::Service);
        assert_eq!(user.auth_method, None);
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let mut raw = user_spec();
        raw.insert("Type".into(), "robot".into());
        match user_from_spec(raw).unwrap_err() {
            CoreError::Validation { entity, field, .. } => {
                assert_eq!(entity, "User");
                assert_eq!(field, "Type");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // ── Workspace ───────────────────────────────────────────────────

    #[test]
    fn workspace_views_and_options() {
        let raw = record(&[
            ("code", "stat"),
            ("Client", "alice-ws"),
            ("Update", "2024/01/01 00:00:00"),
            ("Access", "2024/01/02 00:00:00"),
            ("Owner", "alice"),
            ("Host", "box"),
            ("Description", "Created by alice.\n"),
            ("Root", "/home/alice/ws"),
            ("Options", "allwrite noclobber nocompress unlocked nomodtime rmdir"),
            ("SubmitOptions", "leaveunchanged"),
            ("LineEnd", "local"),
            ("Type", "writeable"),
            ("View0", "//depot/main/... //alice-ws/main/..."),
            ("View1", "\"//depot/with space/...\" \"//alice-ws/with space/...\""),
        ]);
        let ws = Workspace::try_from(raw).unwrap();

        assert_eq!(ws.name, "alice-ws");
        assert_eq!(ws.root, std::path::PathBuf::from("/home/alice/ws"));
        assert!(ws.options.allwrite && ws.options.rmdir && !ws.options.clobber);
        assert_eq!(ws.submit_options, SubmitOptions::LeaveUnchanged);
        assert_eq!(ws.workspace_type, WorkspaceType::Writeable);
        assert_eq!(ws.stream, None);
        assert_eq!(
            ws.views,
            vec![
                View {
                    depot: "//depot/main/...".into(),
                    workspace: "//alice-ws/main/...".into(),
                },
                View {
                    depot: "//depot/with space/...".into(),
                    workspace: "//alice-ws/with space/...".into(),
                },
            ]
        );
        assert_eq!(ws.extra, record(&[("LineEnd", "local")]));
    }

    #[test]
    fn view_needs_exactly_two_paths() {
        assert!(parse_view("//depot/a/...").is_err());
        assert!(parse_view("//a //b //c").is_err());
        assert!(parse_view("\"//depot/open //ws/x").is_err());
        assert_eq!(parse_view("-//depot/x/... //ws/x/...").unwrap().depot, "-//depot/x/...");
    }

    // ── Changelists ─────────────────────────────────────────────────

    #[test]
    fn changelist_spec_with_files() {
        let raw = record(&[
            ("code", "stat"),
            ("Change", "42"),
            ("Date", "2024/02/03 04:05:06"),
            ("Client", "alice-ws"),
            ("User", "alice"),
            ("Status", "pending"),
            ("Type", "public"),
            ("Description", "Fix build\n"),
            ("Files0", "//depot/a.c"),
            ("Files1", "//depot/b.c"),
        ]);
        let change = Changelist::try_from(raw).unwrap();
        assert_eq!(change.change, Some(42));
        assert_eq!(change.status, ChangeStatus::Pending);
        assert_eq!(change.change_type, ChangeType::Public);
        assert_eq!(change.files, ["//depot/a.c", "//depot/b.c"]);
        assert_eq!(change.date, Some(utc(2024, 2, 3, 4, 5, 6)));
        assert!(change.extra.is_empty());
    }

    #[test]
    fn changelist_summary_uses_timestamp() {
        let raw = record(&[
            ("code", "stat"),
            ("change", "7"),
            ("time", "1704067200"),
            ("user", "alice"),
            ("client", "alice-ws"),
            ("status", "submitted"),
            ("changeType", "public"),
            ("path", "//depot/..."),
            ("desc", "Initial import\n"),
        ]);
        let summary = ChangelistSummary::try_from(raw).unwrap();
        assert_eq!(summary.change, 7);
        assert_eq!(summary.date, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(summary.status, ChangeStatus::Submitted);
        assert_eq!(summary.extra, record(&[("path", "//depot/...")]));
    }

    // ── Actions ─────────────────────────────────────────────────────

    #[test]
    fn action_message_splits_on_last_separator() {
        let raw = record(&[
            ("code", "info"),
            ("data", "//depot/a - b.txt - can't add existing file"),
            ("level", "0"),
        ]);
        let msg = ActionMessage::try_from(raw).unwrap();
        assert_eq!(msg.path, "//depot/a - b.txt");
        assert_eq!(msg.message, "can't add existing file");
        assert_eq!(msg.level, MessageLevel::None);
    }

    #[test]
    fn action_message_without_separator() {
        let raw = record(&[("code", "info"), ("data", "nothing to do\n"), ("level", "17")]);
        let msg = ActionMessage::try_from(raw).unwrap();
        assert_eq!(msg.path, "");
        assert_eq!(msg.message, "nothing to do");
        assert_eq!(msg.level, MessageLevel::Empty);
    }

    // ── Fstat ───────────────────────────────────────────────────────

    fn fstat_record() -> Record {
        record(&[
            ("code", "stat"),
            ("depotFile", "//depot/a.txt"),
            ("clientFile", "/ws/a.txt"),
            ("isMapped", ""),
            ("headAction", "edit"),
            ("headType", "text"),
            ("headTime", "1704067200"),
            ("headRev", "3"),
            ("headChange", "12"),
            ("headModTime", "1704067100"),
            ("haveRev", "2"),
            ("otherOpen0", "bob@bob-ws"),
            ("otherAction0", "edit"),
            ("otherChange0", "default"),
            ("otherOpen1", "carol@carol@laptop"),
            ("otherAction1", "delete"),
            ("otherChange1", "15"),
            ("otherOpen", "2"),
        ])
    }

    #[test]
    fn fstat_head_and_other_open() {
        let stat = FileStat::try_from(fstat_record()).unwrap();

        let head = stat.head.unwrap();
        assert_eq!(head.action, FileAction::Edit);
        assert_eq!(head.revision, 3);
        assert_eq!(head.change, 12);
        assert_eq!(head.charset, None);
        assert_eq!(stat.have_rev, Some(2));
        assert!(stat.is_mapped);
        assert_eq!(
            stat.others_open,
            vec![
                OtherOpenEntry {
                    action: FileAction::Edit,
                    change: ChangeRef::Default,
                    user: "bob".into(),
                    client: "bob-ws".into(),
                },
                OtherOpenEntry {
                    action: FileAction::Delete,
                    change: ChangeRef::Number(15),
                    user: "carol".into(),
                    client: "carol@laptop".into(),
                },
            ]
        );
        assert!(stat.extra.is_empty());
    }

    #[test]
    fn fstat_without_head_is_pending_add() {
        let raw = record(&[
            ("code", "stat"),
            ("depotFile", "//depot/new.txt"),
            ("clientFile", "/ws/new.txt"),
            ("action", "add"),
            ("change", "default"),
        ]);
        let stat = FileStat::try_from(raw).unwrap();
        assert!(stat.head.is_none());
        assert!(!stat.is_mapped);
        assert!(stat.others_open.is_empty());
        assert_eq!(stat.extra, record(&[("action", "add"), ("change", "default")]));
    }

    #[test]
    fn fstat_head_charset_is_kept() {
        let mut raw = fstat_record();
        raw.insert("headCharset".into(), "utf8".into());
        let stat = FileStat::try_from(raw).unwrap();
        assert_eq!(stat.head.unwrap().charset.as_deref(), Some("utf8"));
    }

    // ── Revisions / sync / opened ───────────────────────────────────

    #[test]
    fn deleted_revision_has_no_digest_or_size() {
        let raw = record(&[
            ("depotFile", "//depot/a.txt"),
            ("rev", "4"),
            ("change", "20"),
            ("action", "delete"),
            ("type", "text"),
            ("time", "1704067200"),
            ("user", "alice"),
            ("client", "alice-ws"),
            ("desc", "remove"),
        ]);
        let rev = FileRevision::try_from(raw).unwrap();
        assert!(rev.action.is_deletion());
        assert_eq!(rev.digest, None);
        assert_eq!(rev.file_size, None);
    }

    #[test]
    fn sync_result_requires_revision() {
        let raw = record(&[
            ("code", "stat"),
            ("depotFile", "//depot/a.txt"),
            ("clientFile", "/ws/a.txt"),
            ("action", "added"),
            ("fileSize", "10"),
        ]);
        match SyncResult::try_from(raw).unwrap_err() {
            CoreError::Validation { field, .. } => assert_eq!(field, "rev"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn opened_file_in_default_change() {
        let raw = record(&[
            ("code", "stat"),
            ("depotFile", "//depot/a.txt"),
            ("clientFile", "//alice-ws/a.txt"),
            ("rev", "1"),
            ("haveRev", "1"),
            ("action", "edit"),
            ("change", "default"),
            ("type", "text"),
            ("user", "alice"),
            ("client", "alice-ws"),
        ]);
        let opened = OpenedFile::try_from(raw).unwrap();
        assert_eq!(opened.change, ChangeRef::Default);
        assert_eq!(opened.action, FileAction::Edit);
    }

    #[test]
    fn change_refs() {
        assert_eq!(parse_change_ref("default"), Some(ChangeRef::Default));
        assert_eq!(parse_change_ref("15"), Some(ChangeRef::Number(15)));
        assert_eq!(parse_change_ref("soon"), None);
    }
}
