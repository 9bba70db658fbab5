//! INI parser.
//!
//! The accepted syntax:
//!
//! ```ini
//! # comments run to the end of the line
//! port = 8080
//! server.host = example.org        # dotted keys
//! server::tls::cert = ./cert.pem   # `::` works as well
//!
//! [database.pool]   # applies until the next blank line
//! size = 4
//! tags = "a b"
//! tags = 'c'
//! ```
//!
//! Repeating a key appends another value to the same path, and a bare value
//! directly under a group header appends to the group's own path.
//!
//! Parsing runs in two passes over a fixed grammar: a memoizing recognizer
//! that only records which rules match where, followed by a builder that
//! replays those records into a tree. The tree is then interpreted as a
//! [`Document`].

mod ast;
mod build;
mod chars;
mod context;
mod document;
mod error;
mod grammar;
mod input;
mod memo;
mod unescape;

use std::io::{BufReader, Read};

use tracing::trace;

pub use document::Document;
pub use error::{Error, EscapeError, ParseError};
pub(crate) use unescape::{is_bare_safe, quote};

use ast::Tree;
use build::Builder;
use context::Context;

/// Parses INI text from a reader into a document.
pub fn parse<R: Read>(reader: R) -> Result<Document, Error> {
    let tree = parse_tree(reader)?;
    trace!("postprocessing parse tree");
    document::postprocess(&tree)
}

pub fn parse_str(text: &str) -> Result<Document, Error> {
    parse(text.as_bytes())
}

fn parse_tree<R: Read>(reader: R) -> Result<Tree, Error> {
    let mut context = Context::new(BufReader::new(reader));
    trace!("recognizing input");
    context.recognize();
    context.finalize()?;

    let (memo, input) = context.into_parts();
    trace!(chars = input.len(), "building parse tree");
    let root = Builder::new(memo).build_root()?;
    Ok(Tree::new(root, input))
}
