use std::env;
use std::path::Path;
use std::process::Command;

const DEFAULT_EDITOR: &str = "nano";

/// Builds the command that opens `path` in the user's editor.
/// `$EDITOR` may carry arguments ("code --wait"); it is split on
/// whitespace with the first token as the program.
pub fn command(path: &Path) -> Command {
    let (program, args) = resolve_editor(env::var("EDITOR").ok().as_deref());
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.arg(path);
    cmd
}

fn resolve_editor(raw: Option<&str>) -> (String, Vec<String>) {
    let mut fields = raw
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string);
    match fields.next() {
        Some(program) => (program, fields.collect()),
        None => (DEFAULT_EDITOR.to_string(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_editor() {
        let (program, args) = resolve_editor(None);
        assert_eq!(program, DEFAULT_EDITOR);
        assert!(args.is_empty());
        let (program, _) = resolve_editor(Some("   "));
        assert_eq!(program, DEFAULT_EDITOR);
    }

    #[test]
    fn splits_editor_arguments() {
        let (program, args) = resolve_editor(Some("code --wait -n"));
        assert_eq!(program, "code");
        assert_eq!(args, vec!["--wait", "-n"]);
    }
}
