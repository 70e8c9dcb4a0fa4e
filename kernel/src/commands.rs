//! User commands (§5, §6): `LOAD`/`CARGAR`, `KILL`/`MATAR`, `EXIT`/`SALIR`.

use std::path::PathBuf;

use crate::error::CommandError;
use crate::process::{ProcessId, UserId};

/// A parsed, validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load { program_path: PathBuf, uid: UserId },
    Kill { pid: ProcessId },
    Exit,
}

/// Parse one line of user input. Verbs are case-insensitive and accept the
/// Spanish aliases CARGAR/MATAR/SALIR (§5, §6).
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let verb = tokens.first().ok_or(CommandError::Empty)?.to_uppercase();

    match verb.as_str() {
        "LOAD" | "CARGAR" => {
            let &[_, path, uid] = tokens.as_slice() else {
                return Err(CommandError::WrongArity {
                    verb,
                    expected: "<program_path> <uid>",
                });
            };
            let uid: i64 = uid.parse().map_err(|_| CommandError::InvalidUid {
                text: uid.to_string(),
            })?;
            if uid < 0 {
                return Err(CommandError::InvalidUid {
                    text: uid.to_string(),
                });
            }
            Ok(Command::Load {
                program_path: PathBuf::from(path),
                uid: UserId(uid as u32),
            })
        }
        "KILL" | "MATAR" => {
            let &[_, pid] = tokens.as_slice() else {
                return Err(CommandError::WrongArity {
                    verb,
                    expected: "<pid>",
                });
            };
            let pid: u64 = pid.parse().map_err(|_| CommandError::InvalidPid {
                text: pid.to_string(),
            })?;
            Ok(Command::Kill { pid: ProcessId(pid) })
        }
        "EXIT" | "SALIR" => {
            if tokens.len() != 1 {
                return Err(CommandError::WrongArity {
                    verb,
                    expected: "(no arguments)",
                });
            }
            Ok(Command::Exit)
        }
        _ => Err(CommandError::UnknownVerb { verb }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_is_case_insensitive_and_accepts_spanish_alias() {
        assert_eq!(
            parse("load prog.txt 3").unwrap(),
            Command::Load {
                program_path: PathBuf::from("prog.txt"),
                uid: UserId(3)
            }
        );
        assert_eq!(
            parse("cargar prog.txt 3").unwrap(),
            Command::Load {
                program_path: PathBuf::from("prog.txt"),
                uid: UserId(3)
            }
        );
    }

    #[test]
    fn kill_accepts_matar_alias() {
        assert_eq!(parse("MATAR 7").unwrap(), Command::Kill { pid: ProcessId(7) });
    }

    #[test]
    fn exit_accepts_salir_alias() {
        assert_eq!(parse("SALIR").unwrap(), Command::Exit);
    }

    #[test]
    fn negative_uid_is_rejected() {
        assert!(matches!(
            parse("LOAD prog.txt -1"),
            Err(CommandError::InvalidUid { .. })
        ));
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert!(matches!(
            parse("LOAD prog.txt"),
            Err(CommandError::WrongArity { .. })
        ));
        assert!(matches!(parse("EXIT now"), Err(CommandError::WrongArity { .. })));
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert!(matches!(
            parse("FROB x"),
            Err(CommandError::UnknownVerb { .. })
        ));
    }

    #[test]
    fn empty_line_is_rejected() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
    }
}
