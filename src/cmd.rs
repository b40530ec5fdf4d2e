use crate::context::Context;
use crate::error::Error;
use crate::result::Result;
use std::process::{Command, Output, Stdio};

/// Run a command in the base directory and return its exit code.
///
/// Output is streamed in verbose mode; otherwise it is captured and stderr
/// is logged when the command fails. Termination by signal reports `1`.
pub fn status(ctx: &Context, program: &str, args: &[&str]) -> Result<i32> {
    log::debug!("Executing: {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command.args(args).current_dir(&ctx.base_dir);

    let code = if ctx.verbose {
        command
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?
            .code()
    } else {
        let Output { status, stderr, .. } = command.output()?;
        if !status.success() {
            for line in String::from_utf8_lossy(&stderr).lines() {
                log::error!("{}", line);
            }
        }
        status.code()
    };

    Ok(code.unwrap_or(1))
}

/// Run a command in the base directory, failing on a non-zero exit code
pub fn execute(ctx: &Context, program: &str, args: &[&str]) -> Result<()> {
    let code = status(ctx, program, args)?;
    if code != 0 {
        return Err(Error::CommandFailed(format!(
            "{} {} failed with exit code: {}",
            program,
            args.join(" "),
            code
        )));
    }
    Ok(())
}

/// Run a whitespace-separated command line, returning its exit code
pub fn run_line(ctx: &Context, line: &str) -> Result<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.split_first() {
        Some((program, args)) => status(ctx, program, args),
        None => Ok(0),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> Context {
        Context::new(temp.path().join("Cargo.toml"), false)
    }

    #[test]
    fn test_status_reports_exit_code() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        assert_eq!(status(&ctx, "sh", &["-c", "exit 0"]).unwrap(), 0);
        assert_eq!(status(&ctx, "sh", &["-c", "exit 3"]).unwrap(), 3);
    }

    #[test]
    fn test_commands_run_in_base_dir() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        assert_eq!(run_line(&ctx, "touch marker").unwrap(), 0);
        assert!(temp.path().join("marker").exists());
    }

    #[test]
    fn test_execute_fails_on_non_zero() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let err = execute(&ctx, "sh", &["-c", "exit 2"]).unwrap_err();
        assert!(err.to_string().contains("exit code: 2"));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        assert!(status(&ctx, "definitely-not-a-real-program-xyz", &[]).is_err());
    }

    #[test]
    fn test_blank_line_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        assert_eq!(run_line(&context(&temp), "   ").unwrap(), 0);
    }
}
