use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cubby", about = concat!("cubby v", env!("CARGO_PKG_VERSION"), " - know where your things live"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cubby workspace in the current directory
    Init(InitArgs),
    /// Sign in as a user (recorded in cubby.toml)
    Login(LoginArgs),
    /// Sign out and forget the selected project
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your projects
    Projects,
    /// Create or select a project
    Project(ProjectCmd),
    /// List the contents of a folder
    Ls(LsArgs),
    /// Open a folder (`/` for the root, `..` for the parent)
    Cd(CdArgs),
    /// Return to the previously opened folder
    Back,
    /// Print the path of the open folder
    Pwd,
    /// Switch between hierarchy and flat view
    View(ViewArgs),
    /// Open the folder holding an item
    Reveal(RevealArgs),
    /// List every item, newest first
    Flat,
    /// Search item names and notes
    Search(SearchArgs),
    /// Show item details
    Show(ShowArgs),
    /// Show a folder and everything inside it
    Tree(TreeArgs),
    /// Add an item
    Add(AddArgs),
    /// Change an item's name, note or photo
    Edit(EditArgs),
    /// Move an item into another folder
    Mv(MvArgs),
    /// Delete an item and everything inside it
    Rm(RmArgs),
    /// Fill the selected project with sample items
    Seed,
    /// Validate item integrity
    Check,
}

// ---------------------------------------------------------------------------
// Workspace and identity
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Name of the first project (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Sign in as this user right away
    #[arg(long)]
    pub user: Option<String>,
    /// Rewrite cubby.toml even if the workspace exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct LoginArgs {
    /// User id
    pub user_id: String,
    /// Email address to record with the user
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project and select it
    New(ProjectNewArgs),
    /// Select a project by id, id prefix or name
    Use(ProjectUseArgs),
}

#[derive(Args)]
pub struct ProjectNewArgs {
    /// Project name
    pub name: String,
}

#[derive(Args)]
pub struct ProjectUseArgs {
    /// Project id, id prefix or name
    pub project: String,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct LsArgs {
    /// Folder to list (default: the open folder)
    pub folder: Option<String>,
}

#[derive(Args)]
pub struct CdArgs {
    /// Folder id, id prefix or name; `/` for the root, `..` for the parent
    pub target: String,
}

#[derive(Args)]
pub struct ViewArgs {
    /// View mode
    #[arg(value_parser = ["hierarchy", "flat"])]
    pub mode: String,
}

#[derive(Args)]
pub struct RevealArgs {
    /// Item id, id prefix or name
    pub item: String,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Text to look for (case-insensitive)
    pub query: String,
    /// Treat the query as a regular expression
    #[arg(long)]
    pub regex: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Item id, id prefix or name
    pub item: String,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Folder to start from (default: the open folder)
    pub folder: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Item name (default: a timestamp)
    pub name: Option<String>,
    /// Free-text note
    #[arg(long)]
    pub note: Option<String>,
    /// Photo to upload
    #[arg(long, value_name = "FILE")]
    pub image: Option<String>,
    /// Folder to add to (default: the open folder; `/` for the root)
    #[arg(long = "in", value_name = "FOLDER")]
    pub folder: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Item id, id prefix or name
    pub item: String,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New note
    #[arg(long, conflicts_with = "clear_note")]
    pub note: Option<String>,
    /// Remove the note
    #[arg(long)]
    pub clear_note: bool,
    /// Replace the photo
    #[arg(long, value_name = "FILE", conflicts_with = "clear_image")]
    pub image: Option<String>,
    /// Remove the photo
    #[arg(long)]
    pub clear_image: bool,
}

#[derive(Args)]
pub struct MvArgs {
    /// Item id, id prefix or name
    pub item: String,
    /// Destination folder (`/` for the root)
    pub folder: String,
}

#[derive(Args)]
pub struct RmArgs {
    /// Item id, id prefix or name
    pub item: String,
}
