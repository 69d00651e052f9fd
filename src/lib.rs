pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod models;
pub mod reorder;
pub mod session;
pub mod storage;
pub mod view;

use clap::Parser;
use std::process::ExitCode;

pub use config::Config;
pub use db::{BlobStore, MemoryStore, SqliteStore};
pub use engine::{ListState, ReadingList};
pub use error::{EngineError, ProviderError, StoreError};
pub use metadata::{Enricher, MetadataProvider, OfflineProvider, OpenLibraryProvider, SearchMatch};
pub use models::{Book, BookDraft, BookPatch, BookStatus, Metadata};
pub use session::{ReviewEditor, Session};
pub use storage::BookStorage;
pub use view::{compute_stats, derive_view, ListStats, OrderingStrategy, SortKey, StatusFilter, ViewCriteria};

pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = cli::Cli::parse();
    let mut config = Config::from_env();
    args.apply_to(&mut config);

    let store = match SqliteStore::open(&config.db_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("could not open {}: {}", config.db_path.display(), err);
            return ExitCode::FAILURE;
        }
    };
    let storage = BookStorage::new(store, config.storage_key.clone());

    let result = if args.offline {
        let enricher = Enricher::new(OfflineProvider, &config.metadata);
        let mut list = ReadingList::open(storage, enricher, config.ordering);
        cli::execute(&mut list, args.command)
    } else {
        let provider = match OpenLibraryProvider::new(&config.metadata) {
            Ok(provider) => provider,
            Err(err) => {
                eprintln!("could not set up metadata lookups: {}", err);
                return ExitCode::FAILURE;
            }
        };
        let enricher = Enricher::new(provider, &config.metadata);
        let mut list = ReadingList::open(storage, enricher, config.ordering);
        cli::execute(&mut list, args.command)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("command failed: {:?}", err);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
