use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "restructure",
    version,
    about = "Symbol-aware restructuring - move files and directories without breaking references",
    after_help = "Elements are addressed by project path (a/Foo.txt, docs) or, for class \
                  members, by file path and member chain (m/shapes.py::C.bar). \
                  Run 'restructure import <snapshot>' first to load a project model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a JSON project snapshot into .restructure/model.db.
    ///
    /// Replaces any previously imported model. The snapshot lists directories,
    /// files with their text, classes with methods and calls, and references.
    Import {
        /// Snapshot file
        snapshot: String,
    },

    /// Print the stored model as a JSON snapshot
    Export,

    /// Display the containment tree
    Tree,

    /// List references pointing at an element
    Refs {
        /// Element address
        element: String,
    },

    /// Show what a move would rewrite and which conflicts it would hit
    Plan {
        /// Files or directories to move
        #[arg(required = true)]
        elements: Vec<String>,
        /// Destination directory
        #[arg(long)]
        to: String,
    },

    /// Move files or directories and rewrite every reference to them
    Move {
        /// Files or directories to move
        #[arg(required = true)]
        elements: Vec<String>,
        /// Destination directory
        #[arg(long)]
        to: String,
        /// Apply even when conflicts were found
        #[arg(long)]
        force: bool,
    },

    /// Check conflicts of pushing members from a class into subclasses
    PushDown {
        /// Source class address (m/shapes.py::C)
        class: String,
        /// Member to push down (name inside the class, or full address)
        #[arg(short, long = "member", required = true)]
        members: Vec<String>,
        /// Destination class address
        #[arg(short, long = "into", required = true)]
        targets: Vec<String>,
    },

    /// Check stored hashes and that every reference still resolves
    Verify,
}
