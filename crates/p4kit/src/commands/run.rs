//! Raw command handler: any p4 command, records printed as-is.

use std::fmt::Write;

use p4kit_core::{Perforce, Record};

use crate::cli::{GlobalOpts, RunArgs};
use crate::error::CliError;
use crate::output;

fn records_detail(records: &[Record]) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for (key, value) in record {
            let _ = writeln!(out, "{key}: {value}");
        }
    }
    out.trim_end().to_owned()
}

fn records_plain(records: &[Record]) -> String {
    records
        .iter()
        .filter_map(|r| r.get("data").or_else(|| r.get("depotFile")))
        .map(|v| v.trim_end().to_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn handle(p4: &Perforce, args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let records = p4.run(&args.command, args.max_severity.into())?;
    let out = output::render_single(
        &global.format(),
        &records,
        |r| records_detail(r),
        |r| records_plain(r),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn detail_lists_every_field() {
        let records = vec![
            record(&[("code", "stat"), ("userName", "alice")]),
            record(&[("code", "stat"), ("userName", "bob")]),
        ];
        assert_eq!(
            records_detail(&records),
            "code: stat\nuserName: alice\n\ncode: stat\nuserName: bob"
        );
    }

    #[test]
    fn plain_prefers_message_data() {
        let records = vec![
            record(&[("code", "info"), ("data", "Server version: P4D/2024.1\n")]),
            record(&[("code", "stat"), ("depotFile", "//depot/a.txt")]),
            record(&[("code", "stat"), ("other", "x")]),
        ];
        assert_eq!(
            records_plain(&records),
            "Server version: P4D/2024.1\n//depot/a.txt"
        );
    }
}
