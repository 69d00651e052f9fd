use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::db::BlobStore;
use crate::error::Result;
use crate::metadata::MetadataProvider;
use crate::models::{Book, BookDraft, BookPatch, BookStatus};
use crate::engine::ReadingList;
use crate::view::{OrderingStrategy, SortKey, StatusFilter, ViewCriteria};

/// Personal reading-list tracker
#[derive(Parser, Debug)]
#[command(name = "tbr")]
#[command(version)]
pub struct Cli {
    /// SQLite file holding the list
    #[arg(long, env = "TBR_DB_PATH")]
    pub db: Option<PathBuf>,

    /// curated (manual order) or sorted (order by --sort)
    #[arg(long)]
    pub ordering: Option<OrderingStrategy>,

    /// Skip Open Library lookups
    #[arg(long)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the list
    List {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "priority")]
        sort: SortKey,
    },
    /// Add a book
    Add(AddArgs),
    /// Change fields of a book
    Edit(EditArgs),
    /// Remove a book
    Remove { id: String },
    /// Move a book in the curated order
    Move {
        id: String,
        #[arg(long, conflicts_with = "to_end", required_unless_present = "to_end")]
        before: Option<String>,
        #[arg(long)]
        to_end: bool,
    },
    /// Mark a book finished, optionally with a review
    Finish {
        id: String,
        #[arg(long)]
        review: Option<String>,
    },
    /// Rate a book 1-5 (marks it finished)
    Rate { id: String, value: u8 },
    /// Write the review for a book (marks it finished)
    Review { id: String, text: String },
    /// Show totals
    Stats,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub author: String,
    #[arg(long, default_value = "")]
    pub genre: String,
    #[arg(long, default_value = "wishlist")]
    pub status: BookStatus,
    #[arg(long, default_value = "")]
    pub notes: String,
    #[arg(long, default_value_t = 0)]
    pub priority: i64,
    #[arg(long, default_value_t = 0)]
    pub rating: u8,
    #[arg(long, default_value = "")]
    pub review: String,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long)]
    pub status: Option<BookStatus>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub priority: Option<i64>,
    #[arg(long)]
    pub rating: Option<u8>,
    #[arg(long)]
    pub review: Option<String>,
}

impl Cli {
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        if let Some(ordering) = self.ordering {
            config.ordering = ordering;
        }
    }
}

pub fn execute<S, P>(list: &mut ReadingList<S, P>, command: Command) -> Result<()>
where
    S: BlobStore,
    P: MetadataProvider,
{
    match command {
        Command::List {
            status,
            search,
            sort,
        } => {
            let criteria = ViewCriteria {
                search,
                status,
                sort,
            };
            let view = list.view(&criteria);
            if view.is_empty() {
                println!("No books yet.");
            }
            for (index, book) in view.iter().enumerate() {
                println!("{:>3}. {}", index + 1, summary_line(book));
            }
            println!("{} books shown", view.len());
        }
        Command::Add(args) => {
            let book = list.create(BookDraft {
                title: args.title,
                author: args.author,
                genre: args.genre,
                status: args.status,
                notes: args.notes,
                priority: args.priority,
                rating: args.rating,
                review: args.review,
            })?;
            print_details(&book);
        }
        Command::Edit(args) => {
            let book = list.update(
                &args.id,
                BookPatch {
                    title: args.title,
                    author: args.author,
                    genre: args.genre,
                    status: args.status,
                    notes: args.notes,
                    priority: args.priority,
                    rating: args.rating,
                    review: args.review,
                },
            )?;
            print_details(&book);
        }
        Command::Remove { id } => {
            list.remove(&id)?;
            println!("Removed {}", id);
        }
        Command::Move { id, before, to_end } => {
            match before {
                Some(target) if !to_end => list.reorder(&id, &target)?,
                _ => list.move_to_end(&id)?,
            }
            if list.ordering() == OrderingStrategy::Sorted {
                log::warn!("list is sorted; the curated order only shows with --ordering curated");
            }
        }
        Command::Finish { id, review } => {
            let mut book = list.promote_to_finished(&id)?;
            match review {
                Some(text) => {
                    list.update_review_draft(&text);
                    book = list.submit_review(&id)?;
                }
                None => list.close_review_editor(),
            }
            print_details(&book);
        }
        Command::Rate { id, value } => {
            let book = list.set_rating(&id, value)?;
            print_details(&book);
        }
        Command::Review { id, text } => {
            list.open_review_editor(&id)?;
            list.update_review_draft(&text);
            let book = list.submit_review(&id)?;
            print_details(&book);
        }
        Command::Stats => {
            let stats = list.stats();
            println!(
                "total={} reading={} upcoming={}",
                stats.total, stats.active, stats.upcoming
            );
        }
    }
    Ok(())
}

fn summary_line(book: &Book) -> String {
    let author = if book.author.is_empty() {
        "Unknown author"
    } else {
        book.author.as_str()
    };
    let mut line = format!("[{}] {} by {}", book.status.label(), book.title, author);
    if book.is_finished() {
        line.push_str(&format!(" ({})", book.rating_label()));
    }
    line.push_str(&format!("  id={}", book.id));
    line
}

fn print_details(book: &Book) {
    println!("{}", summary_line(book));
    if !book.genre.is_empty() {
        println!("  genre: {}", book.genre);
    }
    if !book.description.is_empty() {
        println!("  {}", book.description);
    }
    if !book.notes.is_empty() {
        println!("  notes: {}", book.notes);
    }
    if book.is_finished() && !book.review.is_empty() {
        println!("  review: \"{}\"", book.review);
    }
    if !book.goodreads_url.is_empty() {
        println!("  {}", book.goodreads_url);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use crate::config::Config;
    use crate::models::BookStatus;
    use crate::view::{OrderingStrategy, SortKey, StatusFilter};
    use clap::Parser;

    #[test]
    fn parses_list_filters() {
        let cli = Cli::try_parse_from(["tbr", "list", "--status", "reading", "--sort", "created"])
            .expect("expected list to parse");
        match cli.command {
            Command::List { status, sort, search } => {
                assert_eq!(status, StatusFilter::Only(BookStatus::Reading));
                assert_eq!(sort, SortKey::Created);
                assert_eq!(search, "");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn move_requires_a_destination() {
        assert!(Cli::try_parse_from(["tbr", "move", "a"]).is_err());
        assert!(Cli::try_parse_from(["tbr", "move", "a", "--to-end"]).is_ok());
        assert!(Cli::try_parse_from(["tbr", "move", "a", "--before", "b"]).is_ok());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from(["tbr", "--db", "/tmp/x.db", "--ordering", "sorted", "stats"])
            .expect("expected stats to parse");
        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert_eq!(config.db_path.to_str(), Some("/tmp/x.db"));
        assert_eq!(config.ordering, OrderingStrategy::Sorted);
    }
}
