//! OpenSSH client-config editing.
//!
//! This module owns the one genuinely delicate piece of ghctx: rewriting
//! `~/.ssh/config` so that exactly one `IdentityFile` is active for a host
//! alias, without disturbing anything else in the file. It handles:
//! - Classifying raw lines (`Host`, `IdentityFile`, everything else opaque).
//! - Grouping lines into host blocks in a single linear pass.
//! - Toggling the comment state of identity-file lines inside one block.
//! - Writing the file back with a single-generation `.bak` backup.
//!
//! The line sequence is the authoritative representation; the block list is
//! derived and fully recomputed after every structural edit. Incremental
//! index patching is not worth the failure modes for a file this small.

use directories::BaseDirs;
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Matches `Host <pattern>` lines, case-insensitive keyword.
static HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*Host\s+(.+?)\s*$").expect("valid host regex"));

/// Matches `IdentityFile <path>` lines, optionally commented out.
static IDENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(#\s*)?IdentityFile\s+(.+?)\s*$").expect("valid identity regex")
});

#[derive(Debug, Error)]
pub enum Error {
    #[error("no Host block for '{host}' in SSH config")]
    HostNotFound { host: String },

    #[error("IdentityFile '{key}' not listed under Host {host}\nAdd it to your SSH config first")]
    KeyNotFound { host: String, key: String },

    #[error("failed to {op} {path}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a single raw config line is, as far as ghctx cares.
///
/// Anything that is not a host declaration or an identity-file declaration is
/// `Opaque` and will be reproduced byte-for-byte by every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    HostDecl { pattern: String },
    IdentityFileDecl { path: String, commented: bool },
    Opaque,
}

/// Classify one raw line. Total: never fails, whatever the input.
pub fn classify(line: &str) -> LineKind {
    if let Some(caps) = HOST_RE.captures(line) {
        return LineKind::HostDecl {
            pattern: caps[1].trim().to_string(),
        };
    }
    if let Some(caps) = IDENTITY_RE.captures(line) {
        return LineKind::IdentityFileDecl {
            path: caps[2].trim().to_string(),
            commented: caps.get(1).is_some(),
        };
    }
    LineKind::Opaque
}

/// One `IdentityFile` declaration inside a host block, commented or not.
#[derive(Debug, Clone)]
pub struct IdentityFileEntry {
    /// Index relative to the block's first line (the `Host` line).
    pub line_index: usize,
    /// Declared path text, exactly as written.
    pub path: String,
    pub commented: bool,
    /// Original line content.
    pub raw: String,
}

/// A `[start, end)` range of lines beginning at a `Host` declaration.
#[derive(Debug, Clone)]
pub struct HostBlock {
    pub start: usize,
    /// Exclusive end line index.
    pub end: usize,
    /// Declared pattern text, trimmed, casing and wildcards preserved.
    pub pattern: String,
    pub identity_files: Vec<IdentityFileEntry>,
}

/// A parsed SSH config file: the line sequence plus derived host blocks.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    lines: Vec<String>,
    blocks: Vec<HostBlock>,
}

/// Group the full line sequence into ordered, non-overlapping host blocks.
///
/// Lines before the first `Host` declaration belong to no block. Idempotent:
/// re-running on unchanged lines yields an identical block list, which is
/// what makes re-deriving after every mutation safe.
fn parse_blocks(lines: &[String]) -> Vec<HostBlock> {
    let mut blocks: Vec<HostBlock> = Vec::new();
    let mut current: Option<HostBlock> = None;

    for (i, line) in lines.iter().enumerate() {
        match classify(line) {
            LineKind::HostDecl { pattern } => {
                if let Some(mut block) = current.take() {
                    block.end = i;
                    blocks.push(block);
                }
                current = Some(HostBlock {
                    start: i,
                    end: lines.len(),
                    pattern,
                    identity_files: Vec::new(),
                });
            }
            LineKind::IdentityFileDecl { path, commented } => {
                if let Some(block) = current.as_mut() {
                    block.identity_files.push(IdentityFileEntry {
                        line_index: i - block.start,
                        path,
                        commented,
                        raw: line.clone(),
                    });
                }
            }
            LineKind::Opaque => {}
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

impl ConfigFile {
    /// Read and parse a config file. A missing file is a valid, empty
    /// configuration so that first-time use works.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let lines = match fs::read_to_string(&path) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(Error::Io {
                    op: "read",
                    path,
                    source: e,
                });
            }
        };

        let blocks = parse_blocks(&lines);
        Ok(Self { path, lines, blocks })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn blocks(&self) -> &[HostBlock] {
        &self.blocks
    }

    /// The raw lines a block spans, `Host` line included.
    pub fn block_lines(&self, block: &HostBlock) -> &[String] {
        &self.lines[block.start..block.end]
    }

    /// Find a host block by literal pattern text, first match wins.
    ///
    /// Deliberately NOT SSH's own matching semantics: `Host *.corp` is only
    /// found by the literal alias `*.corp`, never by `foo.corp`.
    pub fn find_host_block(&self, host: &str) -> Option<&HostBlock> {
        self.blocks.iter().find(|b| b.pattern == host)
    }

    /// The declared path of the first uncommented `IdentityFile` for a host.
    pub fn active_identity_file(&self, host: &str) -> Option<&str> {
        self.find_host_block(host)?
            .identity_files
            .iter()
            .find(|e| !e.commented)
            .map(|e| e.path.as_str())
    }

    /// Make `key_path` the sole active identity file for `host`.
    ///
    /// The matching entry is rewritten to the canonical uncommented form and
    /// every other entry in the block to the commented form; indentation and
    /// declared path text are preserved. Never fabricates a missing entry.
    pub fn activate_key(&mut self, host: &str, key_path: &str) -> Result<(), Error> {
        let block = self.find_host_block(host).ok_or_else(|| Error::HostNotFound {
            host: host.to_string(),
        })?;

        let wanted = normalize_path(key_path);
        if !block
            .identity_files
            .iter()
            .any(|e| normalize_path(&e.path) == wanted)
        {
            return Err(Error::KeyNotFound {
                host: host.to_string(),
                key: key_path.to_string(),
            });
        }

        // Collect edits first; `block` borrows `self`.
        let edits: Vec<(usize, bool)> = block
            .identity_files
            .iter()
            .map(|e| (block.start + e.line_index, normalize_path(&e.path) == wanted))
            .collect();

        for (idx, is_target) in edits {
            let rewritten = if is_target {
                uncomment_identity_line(&self.lines[idx])
            } else {
                comment_identity_line(&self.lines[idx])
            };
            self.lines[idx] = rewritten;
        }

        self.reparse();
        Ok(())
    }

    /// Add an `IdentityFile` line to a host block. No-op if an entry with the
    /// same normalized path already exists, commented or not.
    pub fn add_identity_file(
        &mut self,
        host: &str,
        key_path: &str,
        active: bool,
    ) -> Result<(), Error> {
        let block = self.find_host_block(host).ok_or_else(|| Error::HostNotFound {
            host: host.to_string(),
        })?;

        let wanted = normalize_path(key_path);
        if block
            .identity_files
            .iter()
            .any(|e| normalize_path(&e.path) == wanted)
        {
            return Ok(());
        }

        let indent = detect_indent(self.block_lines(block));
        let new_line = if active {
            format!("{indent}IdentityFile {key_path}")
        } else {
            format!("{indent}# IdentityFile {key_path}")
        };

        // After the last existing entry, or right after the Host line.
        let insert_idx = match block.identity_files.last() {
            Some(last) => block.start + last.line_index + 1,
            None => block.start + 1,
        };

        self.lines.insert(insert_idx, new_line);
        self.reparse();
        Ok(())
    }

    /// Write the config back to disk, snapshotting the current on-disk bytes
    /// to `<path>.bak` first. Not atomic: the backup is the safety net.
    pub fn save(&self) -> Result<(), Error> {
        if self.path.exists() {
            let backup_path = backup_path(&self.path);
            let data = fs::read(&self.path).map_err(|e| Error::Io {
                op: "read for backup",
                path: self.path.clone(),
                source: e,
            })?;
            write_restricted(&backup_path, &data).map_err(|e| Error::Io {
                op: "write backup",
                path: backup_path,
                source: e,
            })?;
        } else if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            create_private_dir(parent).map_err(|e| Error::Io {
                op: "create directory",
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut content = self.lines.join("\n");
        if !self.lines.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }

        write_restricted(&self.path, content.as_bytes()).map_err(|e| Error::Io {
            op: "write",
            path: self.path.clone(),
            source: e,
        })
    }

    fn reparse(&mut self) {
        self.blocks = parse_blocks(&self.lines);
    }
}

/// Sibling backup location, overwritten on every save.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".bak");
    PathBuf::from(os)
}

/// Rewrite an identity-file line to its canonical uncommented form, keeping
/// the original indentation and the declared path text.
fn uncomment_identity_line(line: &str) -> String {
    match classify(line) {
        LineKind::IdentityFileDecl { path, .. } => {
            format!("{}IdentityFile {}", leading_whitespace(line), path)
        }
        _ => line.to_string(),
    }
}

/// Comment out an identity-file line. Already-commented lines come back
/// byte-identical so repeated activation never stacks `#` markers.
fn comment_identity_line(line: &str) -> String {
    match classify(line) {
        LineKind::IdentityFileDecl { commented: true, .. } => line.to_string(),
        LineKind::IdentityFileDecl { path, .. } => {
            format!("{}# IdentityFile {}", leading_whitespace(line), path)
        }
        _ => line.to_string(),
    }
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|&(_, c)| c != ' ' && c != '\t')
        .map_or(line.len(), |(i, _)| i);
    &line[..end]
}

/// Infer the block's indentation from the first indented line after the
/// `Host` declaration, defaulting to four spaces.
fn detect_indent(block_lines: &[String]) -> &str {
    for line in block_lines.iter().skip(1) {
        let indent = leading_whitespace(line);
        if !indent.is_empty() && indent.len() < line.len() {
            return indent;
        }
    }
    "    "
}

/// Normalize a declared key path for comparison only: expand a leading `~/`
/// to the home directory, then collapse `.`/`..`/redundant separators
/// lexically. Display and storage always use the text as written.
fn normalize_path(p: &str) -> PathBuf {
    clean_path(&expand_path(p))
}

/// Expand a leading `~/` to the resolved home directory.
pub fn expand_path(p: &str) -> PathBuf {
    if let Some(rest) = p.strip_prefix("~/")
        && let Some(dirs) = BaseDirs::new()
    {
        return dirs.home_dir().join(rest);
    }
    PathBuf::from(p)
}

/// Does the key file exist on disk? Callers use this before attempting
/// activation; the editor itself never validates key paths.
pub fn key_exists(key_path: &str) -> bool {
    expand_path(key_path).exists()
}

fn clean_path(p: &Path) -> PathBuf {
    let mut stack: Vec<Component> = Vec::new();
    for comp in p.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match stack.last() {
                Some(Component::Normal(_)) => {
                    stack.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => stack.push(comp),
            },
            other => stack.push(other),
        }
    }

    if stack.is_empty() {
        return PathBuf::from(".");
    }
    let mut out = PathBuf::new();
    for comp in &stack {
        out.push(comp.as_os_str());
    }
    out
}

#[cfg(unix)]
fn write_restricted(path: &Path, data: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(data)
}

#[cfg(not(unix))]
fn write_restricted(path: &Path, data: &[u8]) -> std::io::Result<()> {
    fs::write(path, data)
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn classify_host_and_identity_lines() {
        assert_eq!(
            classify("Host work"),
            LineKind::HostDecl {
                pattern: "work".to_string()
            }
        );
        assert_eq!(
            classify("  host GitHub.com  "),
            LineKind::HostDecl {
                pattern: "GitHub.com".to_string()
            }
        );
        assert_eq!(
            classify("    IdentityFile ~/.ssh/id_work"),
            LineKind::IdentityFileDecl {
                path: "~/.ssh/id_work".to_string(),
                commented: false
            }
        );
        assert_eq!(
            classify("  #   identityfile /tmp/key"),
            LineKind::IdentityFileDecl {
                path: "/tmp/key".to_string(),
                commented: true
            }
        );
    }

    #[test]
    fn classify_is_total_over_noise() {
        for line in [
            "",
            "   ",
            "# just a comment",
            "HostName github.com",
            "    User git",
            "IdentitiesOnly yes",
            "Host", // keyword without a pattern
            "\t\u{1f980} not ssh at all",
        ] {
            assert_eq!(classify(line), LineKind::Opaque, "line: {line:?}");
        }
    }

    #[test]
    fn parse_groups_lines_into_blocks() {
        let lines: Vec<String> = [
            "# global preamble",
            "Host work",
            "    HostName github.com",
            "    IdentityFile ~/.ssh/id_work",
            "",
            "Host personal",
            "    # IdentityFile ~/.ssh/id_personal",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let blocks = parse_blocks(&lines);
        assert_eq!(blocks.len(), 2);

        assert_eq!(blocks[0].pattern, "work");
        assert_eq!((blocks[0].start, blocks[0].end), (1, 5));
        assert_eq!(blocks[0].identity_files.len(), 1);
        assert_eq!(blocks[0].identity_files[0].line_index, 2);
        assert!(!blocks[0].identity_files[0].commented);

        assert_eq!(blocks[1].pattern, "personal");
        assert_eq!((blocks[1].start, blocks[1].end), (5, 7));
        assert!(blocks[1].identity_files[0].commented);
    }

    #[test]
    fn parse_is_idempotent() {
        let lines: Vec<String> = ["Host a", "    IdentityFile k1", "Host b"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let first = parse_blocks(&lines);
        let second = parse_blocks(&lines);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!((a.start, a.end, &a.pattern), (b.start, b.end, &b.pattern));
            assert_eq!(a.identity_files.len(), b.identity_files.len());
        }
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = TempDir::new().unwrap();
        let cfg = ConfigFile::load(dir.path().join("absent")).unwrap();
        assert_eq!(cfg.path(), dir.path().join("absent"));
        assert!(cfg.lines().is_empty());
        assert!(cfg.blocks().is_empty());
        assert_eq!(cfg.active_identity_file("anything"), None);
    }

    #[test]
    fn file_without_host_lines_has_no_blocks() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "# only comments\nUser git\n");
        let cfg = ConfigFile::load(path).unwrap();
        assert!(cfg.blocks().is_empty());
        assert_eq!(cfg.active_identity_file("work"), None);
    }

    #[test]
    fn wildcard_pattern_is_matched_literally() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host *.corp\n    IdentityFile /k\n");
        let cfg = ConfigFile::load(path).unwrap();

        // Literal text lookup only; no glob expansion.
        assert!(cfg.find_host_block("foo.corp").is_none());
        assert!(cfg.find_host_block("*.corp").is_some());
    }

    #[test]
    fn activate_swaps_active_entry() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "Host work\n    IdentityFile ~/.ssh/id_work\n    # IdentityFile ~/.ssh/id_personal\n",
        );

        let mut cfg = ConfigFile::load(&path).unwrap();
        cfg.activate_key("work", "~/.ssh/id_personal").unwrap();
        cfg.save().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Host work\n    # IdentityFile ~/.ssh/id_work\n    IdentityFile ~/.ssh/id_personal\n"
        );
        assert_eq!(cfg.active_identity_file("work"), Some("~/.ssh/id_personal"));
    }

    #[test]
    fn activate_leaves_exactly_one_entry_active() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "Host hub\n    IdentityFile /keys/a\n    IdentityFile /keys/b\n    # IdentityFile /keys/c\n",
        );

        let mut cfg = ConfigFile::load(path).unwrap();
        cfg.activate_key("hub", "/keys/c").unwrap();

        let block = cfg.find_host_block("hub").unwrap();
        let active: Vec<_> = block
            .identity_files
            .iter()
            .filter(|e| !e.commented)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].path, "/keys/c");
    }

    #[test]
    fn activate_unknown_host_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work\n    IdentityFile /k\n");
        let before = fs::read_to_string(&path).unwrap();

        let mut cfg = ConfigFile::load(&path).unwrap();
        let err = cfg.activate_key("ghost", "/k").unwrap_err();
        assert!(matches!(err, Error::HostNotFound { .. }));

        cfg.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn activate_unknown_key_is_not_found_and_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work\n    IdentityFile /keys/a\n");

        let mut cfg = ConfigFile::load(path).unwrap();
        let lines_before = cfg.lines().to_vec();
        let err = cfg.activate_key("work", "/keys/missing").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
        assert_eq!(cfg.lines(), lines_before.as_slice());
    }

    #[test]
    fn activate_does_not_stack_comment_markers() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "Host work\n    IdentityFile /keys/a\n    # IdentityFile /keys/b\n",
        );

        let mut cfg = ConfigFile::load(path).unwrap();
        cfg.activate_key("work", "/keys/a").unwrap();
        cfg.activate_key("work", "/keys/a").unwrap();

        assert_eq!(cfg.lines()[2], "    # IdentityFile /keys/b");
    }

    #[test]
    fn activation_compares_normalized_paths() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work\n    IdentityFile /keys//./a\n");

        let mut cfg = ConfigFile::load(path).unwrap();
        cfg.activate_key("work", "/keys/a").unwrap();

        // Declared text survives untouched; only the comparison normalized.
        assert_eq!(cfg.active_identity_file("work"), Some("/keys//./a"));
    }

    #[test]
    fn mutation_is_local_to_the_target_block() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "# preamble stays\nHost other\n    IdentityFile /keys/x\n\nHost work\n    IdentityFile /keys/a\n    # IdentityFile /keys/b\n",
        );

        let mut cfg = ConfigFile::load(&path).unwrap();
        cfg.activate_key("work", "/keys/b").unwrap();
        cfg.save().unwrap();

        let after = fs::read_to_string(&path).unwrap();
        assert!(after.starts_with("# preamble stays\nHost other\n    IdentityFile /keys/x\n\n"));
    }

    #[test]
    fn add_inserts_after_last_entry_with_matching_indent() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "Host work\n    IdentityFile /keys/a\n    User git\n",
        );

        let mut cfg = ConfigFile::load(path).unwrap();
        cfg.add_identity_file("work", "/keys/new", false).unwrap();

        assert_eq!(
            cfg.lines(),
            &[
                "Host work",
                "    IdentityFile /keys/a",
                "    # IdentityFile /keys/new",
                "    User git",
            ]
        );
    }

    #[test]
    fn add_to_empty_block_goes_after_host_line() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work\nHost next\n");

        let mut cfg = ConfigFile::load(path).unwrap();
        cfg.add_identity_file("work", "~/.ssh/id", true).unwrap();

        assert_eq!(
            cfg.lines(),
            &["Host work", "    IdentityFile ~/.ssh/id", "Host next"]
        );
    }

    #[test]
    fn add_reuses_tab_indentation() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work\n\tUser git\n");

        let mut cfg = ConfigFile::load(path).unwrap();
        cfg.add_identity_file("work", "/k", false).unwrap();
        assert_eq!(cfg.lines()[1], "\t# IdentityFile /k");
    }

    #[test]
    fn add_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work\n    IdentityFile /keys/a\n");

        let mut cfg = ConfigFile::load(&path).unwrap();
        cfg.add_identity_file("work", "/keys/new", false).unwrap();
        cfg.save().unwrap();
        let first = fs::read_to_string(&path).unwrap();

        cfg.add_identity_file("work", "/keys/new", false).unwrap();
        cfg.save().unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        // Commented entries count as present too, whichever flag is asked.
        cfg.add_identity_file("work", "/keys/new", true).unwrap();
        let block = cfg.find_host_block("work").unwrap();
        assert_eq!(block.identity_files.len(), 2);
    }

    #[test]
    fn add_unknown_host_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work\n");

        let mut cfg = ConfigFile::load(path).unwrap();
        let err = cfg.add_identity_file("ghost", "/k", true).unwrap_err();
        assert!(matches!(err, Error::HostNotFound { .. }));
    }

    #[test]
    fn round_trip_preserves_structure() {
        let dir = TempDir::new().unwrap();
        let content = "# top\nHost a\n    IdentityFile /k1\n    # IdentityFile /k2\nHost b\n    User git\n";
        let path = write_config(&dir, content);

        let cfg = ConfigFile::load(&path).unwrap();
        cfg.save().unwrap();
        let reread = ConfigFile::load(&path).unwrap();

        assert_eq!(cfg.lines(), reread.lines());
        assert_eq!(cfg.blocks().len(), reread.blocks().len());
        for (a, b) in cfg.blocks().iter().zip(reread.blocks()) {
            assert_eq!(a.pattern, b.pattern);
            assert_eq!((a.start, a.end), (b.start, b.end));
            assert_eq!(a.identity_files.len(), b.identity_files.len());
        }
    }

    #[test]
    fn save_creates_file_without_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ssh").join("config");

        let mut cfg = ConfigFile::load(&path).unwrap();
        cfg.add_identity_file("work", "/k", true).unwrap_err(); // still empty
        cfg.save().unwrap();

        assert!(path.exists());
        assert!(!backup_path(&path).exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn save_backs_up_previous_on_disk_bytes() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work\n    IdentityFile /keys/a\n    # IdentityFile /keys/b\n");

        let mut cfg = ConfigFile::load(&path).unwrap();
        cfg.activate_key("work", "/keys/b").unwrap();
        cfg.save().unwrap();

        let backup = fs::read_to_string(backup_path(&path)).unwrap();
        assert_eq!(
            backup,
            "Host work\n    IdentityFile /keys/a\n    # IdentityFile /keys/b\n"
        );

        // A second save overwrites the single backup generation.
        cfg.activate_key("work", "/keys/a").unwrap();
        cfg.save().unwrap();
        let backup = fs::read_to_string(backup_path(&path)).unwrap();
        assert_eq!(
            backup,
            "Host work\n    # IdentityFile /keys/a\n    IdentityFile /keys/b\n"
        );
    }

    #[test]
    fn save_ends_with_exactly_one_newline() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "Host work");

        let cfg = ConfigFile::load(&path).unwrap();
        cfg.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Host work\n");
    }

    #[test]
    fn clean_path_collapses_lexically() {
        assert_eq!(clean_path(Path::new("/a//b/./c")), PathBuf::from("/a/b/c"));
        assert_eq!(clean_path(Path::new("/a/../b")), PathBuf::from("/b"));
        assert_eq!(clean_path(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(clean_path(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(clean_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn expand_path_only_touches_leading_tilde_slash() {
        assert_eq!(expand_path("/abs/key"), PathBuf::from("/abs/key"));
        assert_eq!(expand_path("rel/key"), PathBuf::from("rel/key"));
        let expanded = expand_path("~/.ssh/id");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with(".ssh/id"));
    }
}
