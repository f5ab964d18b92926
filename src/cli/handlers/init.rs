use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::io::file_store::FileStore;
use crate::io::identity::{IdentityProvider, StaticIdentity};
use crate::io::state::{self, SessionState};
use crate::io::workspace::{self, Workspace};
use crate::session::Session;

const CONFIG_TEMPLATE: &str = r##"# cubby workspace settings

# --- Identity ---
# Set with: cubby login <USER_ID> [--email E]
# The CUBBY_USER environment variable takes precedence.
#
# [user]
# id = "alice"
# email = "alice@example.com"

[store]
# Uploaded photos, relative to .cubby/
blob_dir = "blobs"
# Serve photos from a web server instead of file:// URLs
# public_url_base = "https://cdn.example.com/cubby/"

[navigation]
# Where to land when the open folder is deleted: "root" or "parent"
on_delete = "root"

[log]
# Overridden by CUBBY_LOG
level = "warn"
"##;

/// Infer a project name from a directory name: replace hyphens with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Config text for a new workspace, signed in as `user` when given.
fn render_config(user: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    let Some(user) = user else {
        return Ok(CONFIG_TEMPLATE.to_string());
    };
    let mut doc: toml_edit::DocumentMut = CONFIG_TEMPLATE.parse()?;
    config_io::set_user(&mut doc, user, None);
    Ok(doc.to_string())
}

pub fn cmd_init(args: InitArgs, start: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = start.parent()
        && let Ok(outer) = workspace::discover_workspace(parent)
    {
        eprintln!("Note: enclosing workspace found at {}/", outer.display());
        eprintln!("Creating new workspace in ./{}/", workspace::CUBBY_DIR);
    }

    let user = args.user.as_deref().filter(|u| !u.trim().is_empty());
    let config_text = render_config(user)?;
    let cubby_dir = workspace::init_workspace(start, &config_text, args.force)?;
    println!("Initialized cubby workspace in {}", cubby_dir.display());

    // A first project needs an owner; without one, `project new` does it later.
    let ws = Workspace::load(start)?;
    let Some(owner) = StaticIdentity::from_config(&ws.config).current_user() else {
        println!("Sign in with `cubby login <USER_ID>` to create a project");
        return Ok(());
    };

    let mut session = Session::new(FileStore::open(&ws.data_dir())?);
    session.set_user(Some(owner));
    if !session.fetch_projects()?.is_empty() {
        return Ok(());
    }

    let name = args.name.unwrap_or_else(|| {
        start
            .file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Home".to_string())
    });
    let project = session.create_project(&name)?;
    session.set_current_project(Some(project.id.clone()))?;
    state::write_state(
        &ws.cubby_dir,
        &SessionState {
            current_project: Some(project.id.clone()),
            navigation: session.navigator().clone(),
        },
    )?;
    println!("Created project {}", project.name);
    Ok(())
}
