//! Argument parsing.

use anyhow::{anyhow, bail, Result};
use promptdex_core::AppKind;

pub const USAGE: &str = "\
Usage: promptdex [--admin] <command>

Commands:
  login [username]            Log in (prompts for the password)
  register <username> <email> Create an account (public app only)
  logout                      Forget the stored credential
  whoami                      Print the current session as JSON
  open <path>                 Check whether a route is reachable
  complete-login <url>        Finish an external login from its landing URL
  get <path>                  Authenticated GET, prints the JSON body

Options:
  --admin                     Act as the administrative application
  -h, --help                  Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: Option<String> },
    Register { username: String, email: String },
    Logout,
    WhoAmI,
    Open { path: String },
    CompleteLogin { url: String },
    Get { path: String },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub app: AppKind,
    pub command: Command,
}

pub fn parse(args: &[String]) -> Result<Invocation> {
    let mut app = AppKind::Public;
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--admin" => app = AppKind::Admin,
            "-h" | "--help" => {
                return Ok(Invocation {
                    app,
                    command: Command::Help,
                })
            }
            flag if flag.starts_with("--") => bail!("Unknown option {}", flag),
            _ => positional.push(arg.as_str()),
        }
    }

    let (name, rest) = positional
        .split_first()
        .ok_or_else(|| anyhow!("No command given"))?;

    let command = match (*name, rest) {
        ("login", []) => Command::Login { username: None },
        ("login", [username]) => Command::Login {
            username: Some(username.to_string()),
        },
        ("register", [username, email]) => Command::Register {
            username: username.to_string(),
            email: email.to_string(),
        },
        ("logout", []) => Command::Logout,
        ("whoami", []) => Command::WhoAmI,
        ("open", [path]) => Command::Open {
            path: path.to_string(),
        },
        ("complete-login", [url]) => Command::CompleteLogin {
            url: url.to_string(),
        },
        ("get", [path]) => Command::Get {
            path: path.to_string(),
        },
        ("help", []) => Command::Help,
        (
            "login" | "register" | "logout" | "whoami" | "open" | "complete-login" | "get" | "help",
            _,
        ) => bail!("Wrong number of arguments for '{}'", name),
        (other, _) => bail!("Unknown command '{}'", other),
    };

    Ok(Invocation { app, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_login() {
        let inv = parse(&args(&["login"])).unwrap();
        assert_eq!(inv.app, AppKind::Public);
        assert_eq!(inv.command, Command::Login { username: None });

        let inv = parse(&args(&["--admin", "login", "root"])).unwrap();
        assert_eq!(inv.app, AppKind::Admin);
        assert_eq!(
            inv.command,
            Command::Login {
                username: Some("root".to_string())
            }
        );
    }

    #[test]
    fn test_admin_flag_position_is_free() {
        let inv = parse(&args(&["whoami", "--admin"])).unwrap();
        assert_eq!(inv.app, AppKind::Admin);
        assert_eq!(inv.command, Command::WhoAmI);
    }

    #[test]
    fn test_parse_register_and_open() {
        let inv = parse(&args(&["register", "dave", "dave@example.com"])).unwrap();
        assert_eq!(
            inv.command,
            Command::Register {
                username: "dave".to_string(),
                email: "dave@example.com".to_string()
            }
        );

        let inv = parse(&args(&["open", "/create-prompt"])).unwrap();
        assert_eq!(
            inv.command,
            Command::Open {
                path: "/create-prompt".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&args(&[])).is_err());
        assert!(parse(&args(&["frobnicate"])).is_err());
        assert!(parse(&args(&["open"])).is_err());
        assert!(parse(&args(&["logout", "now"])).is_err());
        assert!(parse(&args(&["--verbose", "whoami"])).is_err());
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(&args(&["--help"])).unwrap().command, Command::Help);
        assert_eq!(parse(&args(&["help"])).unwrap().command, Command::Help);
    }
}
