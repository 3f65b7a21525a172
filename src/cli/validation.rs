use crate::cli::args::{CliArgs, Command};
use crate::filter::StatusFilter;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(source) = args.command.source_args() {
        if source.page_size == Some(0) {
            return Err("invalid page-size, expected positive integer".to_string());
        }
        if let Some(url) = source.api_url.as_deref() {
            reqwest::Url::parse(url).map_err(|e| format!("invalid --api-url '{url}': {e}"))?;
        }
    }
    if let Some(raw) = args
        .command
        .filter_args()
        .and_then(|f| f.status.as_deref())
    {
        raw.parse::<StatusFilter>()
            .map_err(|e| format!("invalid --status '{raw}': {e}"))?;
    }
    match &args.command {
        Command::List(list) => {
            if list.pages == Some(0) {
                return Err("invalid pages, expected positive integer".to_string());
            }
            if list.all && list.pages.is_some() {
                return Err("use either --all or --pages, not both".to_string());
            }
            if let Some(raw) = list.output_format.as_deref() {
                if OutputFormat::parse(raw).is_none() {
                    return Err(format!(
                        "invalid --output-format '{raw}', expected text or json"
                    ));
                }
            }
        }
        Command::Browse(browse) => {
            if browse.viewport == Some(0) {
                return Err("invalid viewport, expected positive integer".to_string());
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_plain_list() {
        assert!(validate(&parse(&["launchlist", "list", "-s", "falcon"])).is_ok());
    }

    #[test]
    fn rejects_unknown_status() {
        let err = validate(&parse(&["launchlist", "browse", "--status", "maybe"])).unwrap_err();
        assert!(err.contains("--status"));
    }

    #[test]
    fn rejects_all_with_pages() {
        assert!(validate(&parse(&["launchlist", "list", "--all", "--pages", "2"])).is_err());
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(validate(&parse(&["launchlist", "list", "--page-size", "0"])).is_err());
        assert!(validate(&parse(&["launchlist", "browse", "--viewport", "0"])).is_err());
    }

    #[test]
    fn rejects_unknown_output_format() {
        assert!(validate(&parse(&["launchlist", "list", "-A", "xml"])).is_err());
    }
}
