//! Layered configuration from INI files, with a packrat INI parser.
//!
//! ```ignore
//! let config: AppConfig = Inifig::builder()
//!     .app_name("myapp")
//!     .load()?;
//! ```
//!
//! That single call searches the platform config directory for `myapp.ini`,
//! merges `MYAPP__*` environment variables, fills in `#[config(default)]`
//! values, and hands you a typed struct.
//!
//! # The INI dialect
//!
//! ```ini
//! # comments run to the end of the line
//! host = example.org
//! database.pool-size = 4        # dotted keys nest
//! database::url = "pg://db"     # so does `::`
//!
//! [upstream]                    # a group lasts until the next blank line
//! port = 8080
//! port = 8081                   # repeating a key collects a list
//! ```
//!
//! Values are text until the target field decides otherwise: `port = 0x1F90`
//! fills a `u16`, `debug = on` fills a `bool`, and a repeated key fills a
//! `Vec`. See [`coerce`] for the rules. The parser is usable on its own
//! through [`ini::parse`] and [`ini::parse_str`].
//!
//! # Struct as source of truth
//!
//! Your config struct (via confique's `Config` derive) is the schema:
//!
//! - **`#[config(default = ...)]`** provides compiled defaults, the lowest layer.
//! - **`///` doc comments** become the comments in generated templates and the
//!   output of `config get`.
//! - **`#[config(nested)]`** maps to INI groups, dotted keys and
//!   double-underscore env var separators.
//! - **`Option<T>` fields** may be omitted in every source. Fields without
//!   `Option` and without a default must be provided by some layer.
//!
//! Keys are matched in snake_case whatever their spelling in the source, so
//! `pool-size`, `poolSize` and `pool_size` all set the `pool_size` field.
//!
//! # Layer precedence
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! Config files          search paths in order, later paths win
//!        ↑ overridden by
//! Environment vars      PREFIX__KEY
//!        ↑ overridden by
//! Overrides             .cli_override()
//! ```
//!
//! Every layer is sparse; unset keys fall through to the layer below.
//!
//! # Discovery
//!
//! [`search_paths()`](InifigBuilder::search_paths) takes [`SearchPath`]
//! entries in priority-ascending order: `Platform`, `Home(".myapp")`, `Cwd`,
//! `Path(dir)` and `Ancestors(boundary)`, which walks up from the current
//! directory until a [`Boundary`]. Missing files are skipped.
//! [`search_mode()`](InifigBuilder::search_mode) picks between deep-merging
//! every file found ([`SearchMode::Merge`]) and using only the highest
//! priority one ([`SearchMode::FirstMatch`]).
//!
//! Files ending in `.json`, `.yaml` or `.yml` are read in those formats; all
//! others are INI.
//!
//! # Environment variables
//!
//! With env prefix `MYAPP`, `MYAPP__HOST` sets `host` and
//! `MYAPP__DATABASE__URL` sets `database.url`. Values stay text and are
//! coerced like INI values. Disable env loading with
//! [`.no_env()`](InifigBuilder::no_env).
//!
//! # Strict mode
//!
//! On by default. A key in a config file that no field consumes fails the
//! load with the file path, key and line:
//!
//! ```text
//! Unknown key 'typo_key' in /home/user/.config/myapp/myapp.ini (line 5)
//! ```
//!
//! # Clap adapter
//!
//! With the `clap` feature (on by default), [`ConfigArgs`] adds
//! `config list|gen|get` subcommands. `config gen` writes a commented INI
//! template built from the struct's docs and defaults.

pub mod coerce;
pub mod error;
pub mod format;
pub mod ini;
pub mod keys;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod env;
mod file;
pub(crate) mod merge;
mod ops;
mod overrides;
mod resolve;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Inifig, InifigBuilder};
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use error::InifigError;
pub use ops::ConfigResult;
pub use types::{Boundary, ConfigAction, SearchMode, SearchPath};
