//! Command-line arguments.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;

/// Send one message through an SMTP relay
#[derive(Parser, Debug)]
#[command(name = "postline")]
#[command(about = "Send one message through an SMTP relay", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the JSON sender configuration
    #[arg(short, long)]
    pub config: PathBuf,

    /// Recipients, comma-separated
    #[arg(short, long)]
    pub to: String,

    /// Subject line
    #[arg(short, long)]
    pub subject: String,

    /// Read the body from this file instead of stdin
    #[arg(short, long)]
    pub body_file: Option<PathBuf>,

    /// Attach a file, optionally with its MIME type (`path[:type]`)
    #[arg(short, long = "attach", value_name = "PATH[:TYPE]")]
    pub attachments: Vec<AttachmentArg>,

    /// Body content type
    #[arg(long, default_value = postline_core::DEFAULT_CONTENT_TYPE)]
    pub content_type: String,

    /// Body charset label
    #[arg(long, default_value = postline_core::DEFAULT_CHARSET)]
    pub charset: String,
}

/// An `--attach` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentArg {
    /// File to read.
    pub path: PathBuf,
    /// Declared MIME type.
    pub content_type: String,
}

impl AttachmentArg {
    /// Name shown to the recipient.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

impl FromStr for AttachmentArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("attachment path is empty".into());
        }

        // A suffix is a type only if it looks like one: `C:notes.txt` is a path.
        if let Some((path, content_type)) = s.rsplit_once(':') {
            if is_mime_type(content_type) && !path.is_empty() {
                return Ok(Self {
                    path: PathBuf::from(path),
                    content_type: content_type.to_string(),
                });
            }
        }

        let path = PathBuf::from(s);
        let content_type = guess_content_type(&path).to_string();
        Ok(Self { path, content_type })
    }
}

fn is_mime_type(s: &str) -> bool {
    s.split_once('/').is_some_and(|(main, sub)| {
        !main.is_empty()
            && !sub.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "/.+-_".contains(c))
    })
}

/// MIME type from the file extension, `application/octet-stream` if unknown.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("txt" | "log") => "text/plain",
        Some("htm" | "html") => "text/html",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn attach_with_explicit_type() {
        let arg: AttachmentArg = "report.bin:application/pdf".parse().unwrap();
        assert_eq!(arg.path, PathBuf::from("report.bin"));
        assert_eq!(arg.content_type, "application/pdf");
        assert_eq!(arg.filename(), "report.bin");
    }

    #[test]
    fn attach_guesses_type_from_extension() {
        let arg: AttachmentArg = "/tmp/photo.JPG".parse().unwrap();
        assert_eq!(arg.content_type, "image/jpeg");
        assert_eq!(arg.filename(), "photo.JPG");

        let arg: AttachmentArg = "data.unknown".parse().unwrap();
        assert_eq!(arg.content_type, "application/octet-stream");
    }

    #[test]
    fn attach_path_with_colon_is_not_a_type() {
        let arg: AttachmentArg = "C:notes.txt".parse().unwrap();
        assert_eq!(arg.path, PathBuf::from("C:notes.txt"));
        assert_eq!(arg.content_type, "text/plain");
    }

    #[test]
    fn attach_rejects_empty() {
        assert!("".parse::<AttachmentArg>().is_err());
    }

    #[test]
    fn cli_parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "postline",
            "--config",
            "cfg.json",
            "--to",
            "a@x.com,b@y.com",
            "--subject",
            "Hi",
            "--attach",
            "a.pdf",
            "--attach",
            "b.dat:text/csv",
            "--content-type",
            "text/plain",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("cfg.json"));
        assert_eq!(cli.to, "a@x.com,b@y.com");
        assert!(cli.body_file.is_none());
        assert_eq!(cli.attachments.len(), 2);
        assert_eq!(cli.attachments[1].content_type, "text/csv");
        assert_eq!(cli.content_type, "text/plain");
        assert_eq!(cli.charset, "utf8");
    }

    #[test]
    fn cli_requires_recipients() {
        assert!(Cli::try_parse_from(["postline", "--config", "c.json", "--subject", "s"]).is_err());
    }
}
