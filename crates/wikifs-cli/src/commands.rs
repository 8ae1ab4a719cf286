//! Subcommands: one per wiki verb.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use clap::Subcommand;

use wikifs_kernel::{
    DeleteOptions, DirectoryEntry, EntryKind, FileStat, RenameOptions, Router, VirtualUri, WikiFs,
    WriteFileOptions,
};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a directory
    Ls { uri: String },

    /// Print a document
    Cat { uri: String },

    /// Write a document from stdin
    Write {
        uri: String,
        /// Fail if the document does not exist yet
        #[arg(long)]
        no_create: bool,
        /// Fail if the document already exists
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Create a directory (and parents)
    Mkdir { uri: String },

    /// Delete a document or directory
    Rm {
        uri: String,
        /// Delete non-empty directories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Move a document or directory within its workspace
    Mv {
        from: String,
        to: String,
        /// Replace an existing target
        #[arg(long)]
        overwrite: bool,
    },

    /// Show entry metadata
    Stat { uri: String },
}

fn parse(uri: &str) -> Result<VirtualUri> {
    VirtualUri::parse(uri).with_context(|| format!("bad uri {uri:?}"))
}

fn kind_label(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Directory => "dir",
        EntryKind::File => "file",
        EntryKind::SymbolicLink => "link",
        EntryKind::Unknown => "other",
    }
}

fn print_listing(out: &mut impl Write, entries: &[DirectoryEntry], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, entries)?;
        writeln!(out)?;
        return Ok(());
    }
    for entry in entries {
        let suffix = if entry.kind.is_dir() { "/" } else { "" };
        writeln!(out, "{:<5} {}{}", kind_label(entry.kind), entry.name, suffix)?;
    }
    Ok(())
}

fn print_stat(out: &mut impl Write, stat: &FileStat, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, stat)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "kind:     {}", kind_label(stat.kind))?;
    writeln!(out, "size:     {}", stat.size)?;
    writeln!(out, "created:  {}", stat.created_at)?;
    writeln!(out, "modified: {}", stat.modified_at)?;
    Ok(())
}

/// Run one subcommand against `router`.
pub async fn run(
    router: &Router,
    command: Command,
    json: bool,
    input: &mut impl Read,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Ls { uri } => {
            let entries = router.read_directory(&parse(&uri)?).await?;
            print_listing(out, &entries, json)
        }
        Command::Cat { uri } => {
            let content = router.read_file(&parse(&uri)?).await?;
            out.write_all(&content)?;
            Ok(())
        }
        Command::Write {
            uri,
            no_create,
            no_overwrite,
        } => {
            let target = parse(&uri)?;
            let mut content = Vec::new();
            input.read_to_end(&mut content).context("reading stdin")?;
            let options = WriteFileOptions {
                create: !no_create,
                overwrite: !no_overwrite,
            };
            router.write_file(&target, &content, options).await?;
            tracing::info!(uri = %target, bytes = content.len(), "wrote document");
            Ok(())
        }
        Command::Mkdir { uri } => Ok(router.create_directory(&parse(&uri)?).await?),
        Command::Rm { uri, recursive } => {
            Ok(router.delete(&parse(&uri)?, DeleteOptions { recursive }).await?)
        }
        Command::Mv {
            from,
            to,
            overwrite,
        } => {
            let options = RenameOptions { overwrite };
            Ok(router.rename(&parse(&from)?, &parse(&to)?, options).await?)
        }
        Command::Stat { uri } => {
            let stat = router.stat(&parse(&uri)?).await?;
            print_stat(out, &stat, json)
        }
    }
}
