//! Path helpers: user path expansion, display notes, and extension checks.

use std::borrow::Cow;
use std::path::{MAIN_SEPARATOR, Path};
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("env var pattern is valid")
});

/// Expand a leading `~` to the home directory, then `$VAR` / `${VAR}`
/// references to their environment values. Unset variables expand to "".
pub fn expand_path(path: &str) -> String {
    let homed = expand_home(path);
    ENV_VAR
        .replace_all(&homed, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            std::env::var(name).unwrap_or_default()
        })
        .into_owned()
}

fn expand_home(path: &str) -> Cow<'_, str> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with(MAIN_SEPARATOR) => rest,
        // `~user` forms are left alone
        _ => return Cow::Borrowed(path),
    };
    match dirs::home_dir() {
        Some(home) => Cow::Owned(format!("{}{rest}", home.display())),
        None => Cow::Borrowed(path),
    }
}

/// The path as shown to the user: `full_path` with the working directory
/// prefix removed. Symlinks are resolved on both sides first so a linked
/// checkout still produces short names.
pub fn strip_absolute_path(full_path: &Path, cwd: &Path) -> String {
    let full = full_path
        .canonicalize()
        .unwrap_or_else(|_| full_path.to_path_buf());
    let base = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
    relative_note(&full, &base)
}

/// Lexical form of [`strip_absolute_path`]. Touches no filesystem, so it only
/// shortens paths spelled with the same prefix as `base`, such as walker
/// output under its own root.
pub fn relative_note(full_path: &Path, base: &Path) -> String {
    match full_path.strip_prefix(base) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => full_path.display().to_string(),
    }
}

/// Normalise configured extensions (`md`, `.md`) to glob patterns (`*.md`).
pub fn glob_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| match ext.strip_prefix('.') {
            Some(bare) => format!("*.{bare}"),
            None => format!("*.{ext}"),
        })
        .collect()
}

/// Files without an extension are assumed to be markdown; anything else must
/// match one of `extensions` case-insensitively.
pub fn is_markdown_file(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return true;
    };
    extensions
        .iter()
        .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(&ext))
}

/// Wrap source text in a fenced code block so it renders as code.
pub fn wrap_code_block(body: &str, language: &str) -> String {
    let mut out = format!("```{language}\n{body}");
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```");
    out
}
