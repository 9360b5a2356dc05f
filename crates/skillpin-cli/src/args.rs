use anyhow::{bail, Result};

const USAGE: &str = "usage: skillpin <install [--force] | add <source> [skill] [branch] | update [name...] | remove <name> | status>";

/// One lifecycle operation selected on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Install { force: bool },
    Add {
        source: String,
        skill: Option<String>,
        branch: Option<String>,
    },
    Update { names: Vec<String> },
    Remove { name: String },
    Status,
}

impl Command {
    /// Parse the verb and its positional operands; the program name is not included
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(verb) = args.next() else {
            bail!(USAGE);
        };
        let rest: Vec<String> = args.collect();

        let command = match (verb.as_str(), rest.as_slice()) {
            ("install", []) => Command::Install { force: false },
            ("install", [flag]) if flag == "--force" => Command::Install { force: true },
            ("add", [source, more @ ..]) if more.len() <= 2 => Command::Add {
                source: source.clone(),
                skill: more.first().cloned(),
                branch: more.get(1).cloned(),
            },
            ("update", names) => Command::Update {
                names: names.to_vec(),
            },
            ("remove", [name]) => Command::Remove { name: name.clone() },
            ("status", []) => Command::Status,
            _ => bail!(USAGE),
        };
        Ok(command)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command> {
        Command::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_parse_verbs() {
        assert_eq!(parse(&["install"]).unwrap(), Command::Install { force: false });
        assert_eq!(parse(&["install", "--force"]).unwrap(), Command::Install { force: true });
        assert_eq!(
            parse(&["add", "anthropics/skills", "pdf"]).unwrap(),
            Command::Add {
                source: "anthropics/skills".into(),
                skill: Some("pdf".into()),
                branch: None,
            }
        );
        assert_eq!(
            parse(&["update", "pdf", "xlsx"]).unwrap(),
            Command::Update {
                names: vec!["pdf".into(), "xlsx".into()]
            }
        );
        assert_eq!(parse(&["update"]).unwrap(), Command::Update { names: vec![] });
        assert_eq!(
            parse(&["remove", "pdf"]).unwrap(),
            Command::Remove { name: "pdf".into() }
        );
        assert_eq!(parse(&["status"]).unwrap(), Command::Status);
    }

    #[test]
    fn test_parse_rejects_bad_usage() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["add"]).is_err());
        assert!(parse(&["remove"]).is_err());
        assert!(parse(&["install", "--now"]).is_err());
        assert!(parse(&["publish"]).is_err());
    }
}
