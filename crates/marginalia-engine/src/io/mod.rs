use crate::document::Document;
use crate::suggestion::{Proposal, RawProposal};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid proposal list in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Proposal files are either a bare array or an object wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProposalFile {
    List(Vec<RawProposal>),
    Wrapped { suggestions: Vec<RawProposal> },
}

/// Read a manuscript file into a document
pub fn read_manuscript(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    Ok(Document::from_text(&text))
}

/// Write a document back out in its serialized form
pub fn write_manuscript(path: &Path, doc: &Document) -> Result<(), IoError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut text = doc.to_text();
    text.push('\n');
    fs::write(path, text).map_err(IoError::Io)
}

/// Read a JSON proposal list
pub fn read_proposals(path: &Path) -> Result<Vec<Proposal>, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    parse_proposals(&json).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_proposals(json: &str) -> Result<Vec<Proposal>, serde_json::Error> {
    let raw = match serde_json::from_str::<ProposalFile>(json)? {
        ProposalFile::List(list) => list,
        ProposalFile::Wrapped { suggestions } => suggestions,
    };
    Ok(raw.into_iter().map(Proposal::from).collect())
}
