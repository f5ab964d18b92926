mod init;
pub use init::cmd_init;

use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::blob_store::FsBlobStore;
use crate::io::config_io;
use crate::io::file_store::FileStore;
use crate::io::identity::{IdentityProvider, StaticIdentity, USER_ENV};
use crate::io::lock::StoreLock;
use crate::io::state::{self, SessionState};
use crate::io::workspace::Workspace;
use crate::model::item::{Item, ItemChanges, ItemDraft, ItemId, ItemSet};
use crate::model::project::Project;
use crate::ops::navigation::ViewMode;
use crate::ops::{check, demo, search, tree};
use crate::session::{Outcome, Session, SessionError};

const SIGNED_OUT: &str = "not signed in (run `cubby login <USER_ID>` or set CUBBY_USER)";
const NO_PROJECT: &str = "no project selected (run `cubby project new <NAME>` or `cubby project use <PROJECT>`)";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let start = start_dir(cli.workspace_dir.as_deref())?;

    match cli.command {
        None => cmd_here(&start, json),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(args, &start),

            // Identity
            Commands::Login(args) => cmd_login(args, &start, json),
            Commands::Logout => cmd_logout(&start),
            Commands::Whoami => cmd_whoami(&start, json),

            // Projects
            Commands::Projects => cmd_projects(&start, json),
            Commands::Project(cmd) => match cmd.action {
                ProjectAction::New(args) => cmd_project_new(args, &start, json),
                ProjectAction::Use(args) => cmd_project_use(args, &start, json),
            },

            // Read and navigate
            Commands::Ls(args) => cmd_ls(args, &start, json),
            Commands::Cd(args) => cmd_cd(args, &start, json),
            Commands::Back => cmd_back(&start, json),
            Commands::Pwd => cmd_pwd(&start, json),
            Commands::View(args) => cmd_view(args, &start, json),
            Commands::Reveal(args) => cmd_reveal(args, &start, json),
            Commands::Flat => cmd_flat(&start, json),
            Commands::Search(args) => cmd_search(args, &start, json),
            Commands::Show(args) => cmd_show(args, &start, json),
            Commands::Tree(args) => cmd_tree(args, &start, json),

            // Write commands
            Commands::Add(args) => cmd_add(args, &start, json),
            Commands::Edit(args) => cmd_edit(args, &start, json),
            Commands::Mv(args) => cmd_mv(args, &start),
            Commands::Rm(args) => cmd_rm(args, &start),
            Commands::Seed => cmd_seed(&start, json),

            Commands::Check => cmd_check(&start, json),
        },
    }
}

/// Log filter from the workspace config, or `warn` outside a workspace.
pub fn configured_log_level(workspace_dir: Option<&str>) -> String {
    start_dir(workspace_dir)
        .ok()
        .and_then(|start| Workspace::discover(&start).ok())
        .map(|ws| ws.config.log.level)
        .unwrap_or_else(|| "warn".to_string())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e).into()),
        None => Ok(std::env::current_dir()?),
    }
}

/// An opened workspace with a session resumed from `.state.json`.
struct Context {
    workspace: Workspace,
    session: Session<FileStore>,
    json: bool,
    _lock: Option<StoreLock>,
}

impl Context {
    /// Open for reading and navigation.
    fn open(start: &Path, json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        Self::open_inner(start, json, false)
    }

    /// Open holding the store lock until the context is dropped.
    fn open_locked(start: &Path, json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        Self::open_inner(start, json, true)
    }

    fn open_inner(start: &Path, json: bool, lock: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let workspace = Workspace::discover(start)?;
        let lock = if lock {
            Some(StoreLock::acquire_default(&workspace.cubby_dir)?)
        } else {
            None
        };
        let store = FileStore::open(&workspace.data_dir())?;
        let mut session = Session::new(store).with_delete_policy(workspace.config.navigation.on_delete);
        let identity = StaticIdentity::from_config(&workspace.config);
        session.set_user(identity.current_user());

        if session.user().is_some() {
            session.fetch_projects()?;
            let saved = state::read_state(&workspace.cubby_dir).unwrap_or_default();
            let project = saved
                .current_project
                .filter(|id| session.projects().iter().any(|p| &p.id == id));
            session.resume(project, saved.navigation)?;
        }

        Ok(Context {
            workspace,
            session,
            json,
            _lock: lock,
        })
    }

    fn save_state(&self) -> Result<(), Box<dyn std::error::Error>> {
        let state = SessionState {
            current_project: self.session.current_project_id().cloned(),
            navigation: self.session.navigator().clone(),
        };
        state::write_state(&self.workspace.cubby_dir, &state)?;
        Ok(())
    }

    fn require_user(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self.session.user() {
            Some(_) => Ok(()),
            None => Err(SIGNED_OUT.into()),
        }
    }

    fn require_project(&self) -> Result<&Project, Box<dyn std::error::Error>> {
        self.require_user()?;
        self.session.current_project().ok_or_else(|| NO_PROJECT.into())
    }

    fn blob_store(&self) -> FsBlobStore {
        FsBlobStore::new(self.workspace.blob_dir())
            .with_public_url_base(self.workspace.config.store.public_url_base.clone())
    }

    /// Copy a local photo into the blob store and return its URL.
    fn upload(&self, file: &str) -> Result<String, Box<dyn std::error::Error>> {
        let project = self.require_project()?.id.clone();
        let url = self.blob_store().upload_file(&project, Path::new(file))?;
        Ok(url)
    }

    fn item(&self, reference: &str) -> Result<&Item, Box<dyn std::error::Error>> {
        let id = resolve_item(self.session.items(), reference)?;
        self.session
            .item(id.as_str())
            .ok_or_else(|| format!("item not found: {}", reference).into())
    }

    fn folder(&self, reference: &str) -> Result<Option<ItemId>, Box<dyn std::error::Error>> {
        resolve_folder(self.session.items(), self.session.current_folder(), reference)
    }
}

/// Find an item by exact id, then unique id prefix, then unique
/// case-insensitive name.
fn resolve_item(items: &ItemSet, reference: &str) -> Result<ItemId, Box<dyn std::error::Error>> {
    if reference.trim().is_empty() {
        return Err("empty item reference".into());
    }
    if let Some(item) = items.get(reference) {
        return Ok(item.id.clone());
    }

    let by_prefix: Vec<&Item> = items
        .iter()
        .filter(|i| i.id.as_str().starts_with(reference))
        .collect();
    match by_prefix.as_slice() {
        [one] => return Ok(one.id.clone()),
        [] => {}
        many => return Err(ambiguous(reference, many)),
    }

    let wanted = reference.to_lowercase();
    let by_name: Vec<&Item> = items
        .iter()
        .filter(|i| i.name.to_lowercase() == wanted)
        .collect();
    match by_name.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => Err(format!("item not found: {}", reference).into()),
        many => Err(ambiguous(reference, many)),
    }
}

fn ambiguous(reference: &str, candidates: &[&Item]) -> Box<dyn std::error::Error> {
    let listed: Vec<String> = candidates
        .iter()
        .map(|i| format!("{} ({})", i.name, short_id(i.id.as_str())))
        .collect();
    format!("'{}' is ambiguous: {}", reference, listed.join(", ")).into()
}

/// `/` is the root, `..` the parent of `current`; anything else is an item
/// reference.
fn resolve_folder(
    items: &ItemSet,
    current: Option<&ItemId>,
    reference: &str,
) -> Result<Option<ItemId>, Box<dyn std::error::Error>> {
    match reference {
        "/" => Ok(None),
        ".." => Ok(current.and_then(|id| tree::parent_of(items, id.as_str())).map(|p| p.id.clone())),
        _ => resolve_item(items, reference).map(Some),
    }
}

/// Find a project by exact id, then unique id prefix, then unique
/// case-insensitive name.
fn resolve_project<'a>(projects: &'a [Project], reference: &str) -> Result<&'a Project, Box<dyn std::error::Error>> {
    if let Some(p) = projects.iter().find(|p| p.id.as_str() == reference) {
        return Ok(p);
    }
    let wanted = reference.to_lowercase();
    let by_prefix: Vec<&Project> = projects
        .iter()
        .filter(|p| !reference.is_empty() && p.id.as_str().starts_with(reference))
        .collect();
    let candidates = if by_prefix.is_empty() {
        projects
            .iter()
            .filter(|p| p.name.to_lowercase() == wanted)
            .collect()
    } else {
        by_prefix
    };
    match candidates.as_slice() {
        [one] => Ok(*one),
        [] => Err(format!("project not found: {}", reference).into()),
        many => {
            let listed: Vec<String> = many
                .iter()
                .map(|p| format!("{} ({})", p.name, short_id(p.id.as_str())))
                .collect();
            Err(format!("'{}' is ambiguous: {}", reference, listed.join(", ")).into())
        }
    }
}

/// Rejected requests are reported but are not failures.
fn warn(e: impl std::fmt::Display) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("warning: {}", e);
    Ok(())
}

/// Confirmed value, `None` when nothing changed, or an error after rollback.
fn settled<T>(outcome: Outcome<T>, action: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match outcome {
        Outcome::Confirmed(value) => Ok(Some(value)),
        Outcome::Unchanged => Ok(None),
        Outcome::RolledBack { reason } => {
            Err(format!("{} failed and was undone: {}", action, reason).into())
        }
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// List the children of `folder` (`None` = root).
fn print_folder(ctx: &Context, folder: Option<&ItemId>) -> Result<(), Box<dyn std::error::Error>> {
    let items = ctx.session.items();
    let (path, folder_item) = match folder {
        Some(id) => {
            let item = items
                .get(id.as_str())
                .ok_or_else(|| format!("item not found: {}", id))?;
            let mut path = ctx.session.path(id.as_str())?;
            path.push(item);
            (path, Some(item))
        }
        None => (Vec::new(), None),
    };
    let children = ctx.session.children(folder.map(|id| id.as_str()));

    if ctx.json {
        let out = FolderJson {
            folder: folder_item.map(|i| item_to_json(items, i)).transpose()?,
            path: crumbs(&path),
            children: children
                .iter()
                .map(|c| item_to_json(items, c))
                .collect::<Result<_, _>>()?,
        };
        print_json(&out)
    } else {
        print_lines(format_listing(items, &path, &children));
        Ok(())
    }
}

fn print_flat(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let items = ctx.session.items();
    let flat = ctx.session.flat_view();
    if ctx.json {
        let out = flat
            .iter()
            .map(|i| item_to_json(items, i))
            .collect::<Result<Vec<_>, _>>()?;
        return print_json(&out);
    }
    if flat.is_empty() {
        println!("(no items)");
    }
    for item in flat {
        println!("{}", format_located_line(items, item));
    }
    Ok(())
}

fn print_location(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.session.current_path()?;
    if ctx.json {
        let out = LocationJson {
            project: ctx.session.current_project().map(|p| p.name.as_str()),
            path: crumbs(&path),
            view: ctx.session.view(),
            history_depth: ctx.session.navigator().history().len(),
        };
        print_json(&out)
    } else {
        println!("{}", format_breadcrumb(&path));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Identity commands
// ---------------------------------------------------------------------------

fn cmd_login(args: LoginArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if args.user_id.trim().is_empty() {
        return warn("user id cannot be empty");
    }
    let workspace = Workspace::discover(start)?;
    let (config, mut doc) = config_io::read_config(&workspace.cubby_dir)?;
    let previous = config.user.as_ref().map(|u| u.id.clone());

    config_io::set_user(&mut doc, &args.user_id, args.email.as_deref());
    config_io::write_config(&workspace.cubby_dir, &doc)?;
    if previous.as_deref() != Some(args.user_id.as_str()) {
        state::clear_state(&workspace.cubby_dir)?;
    }
    tracing::debug!(user = %args.user_id, "login recorded");

    if let Ok(env_user) = std::env::var(USER_ENV)
        && !env_user.trim().is_empty()
        && env_user != args.user_id
    {
        eprintln!("note: {}={} takes precedence over the configured user", USER_ENV, env_user);
    }

    if json {
        print_json(&serde_json::json!({ "id": args.user_id, "email": args.email }))
    } else {
        println!("Signed in as {}", args.user_id);
        Ok(())
    }
}

fn cmd_logout(start: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = Workspace::discover(start)?;
    let (_, mut doc) = config_io::read_config(&workspace.cubby_dir)?;
    let had_user = config_io::clear_user(&mut doc);
    if had_user {
        config_io::write_config(&workspace.cubby_dir, &doc)?;
    }
    state::clear_state(&workspace.cubby_dir)?;
    if had_user {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

fn cmd_whoami(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = Workspace::discover(start)?;
    let user = StaticIdentity::from_config(&workspace.config).current_user();
    if json {
        return print_json(&serde_json::json!({ "user": user }));
    }
    match user {
        Some(user) => match user.email {
            Some(email) => println!("{} <{}>", user.id, email),
            None => println!("{}", user.id),
        },
        None => println!("Not signed in"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Project commands
// ---------------------------------------------------------------------------

fn cmd_projects(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_user()?;
    let current = ctx.session.current_project_id();

    if json {
        let out: Vec<ProjectJson> = ctx
            .session
            .projects()
            .iter()
            .map(|p| ProjectJson {
                project: p,
                current: Some(&p.id) == current,
            })
            .collect();
        return print_json(&out);
    }
    if ctx.session.projects().is_empty() {
        println!("(no projects)");
    }
    for p in ctx.session.projects() {
        println!("{}", format_project_line(p, Some(&p.id) == current));
    }
    Ok(())
}

fn cmd_project_new(args: ProjectNewArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open_locked(start, json)?;
    ctx.require_user()?;
    let project = match ctx.session.create_project(&args.name) {
        Ok(p) => p,
        Err(e @ SessionError::EmptyName) => return warn(e),
        Err(e) => return Err(e.into()),
    };
    ctx.session.set_current_project(Some(project.id.clone()))?;
    ctx.save_state()?;

    if json {
        print_json(&ProjectJson {
            project: &project,
            current: true,
        })
    } else {
        println!("Created project {} ({})", project.name, short_id(project.id.as_str()));
        Ok(())
    }
}

fn cmd_project_use(args: ProjectUseArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open(start, json)?;
    ctx.require_user()?;
    let id = resolve_project(ctx.session.projects(), &args.project)?.id.clone();
    ctx.session.set_current_project(Some(id))?;
    ctx.save_state()?;

    let project = ctx.require_project()?;
    if json {
        print_json(&ProjectJson {
            project,
            current: true,
        })
    } else {
        println!("Using project {}", project.name);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Read and navigation commands
// ---------------------------------------------------------------------------

/// Bare `cubby`: the open folder, or every item in flat view.
fn cmd_here(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_project()?;
    match ctx.session.view() {
        ViewMode::Hierarchy => print_folder(&ctx, ctx.session.current_folder()),
        ViewMode::Flat => print_flat(&ctx),
    }
}

fn cmd_ls(args: LsArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_project()?;
    let folder = match &args.folder {
        Some(reference) => ctx.folder(reference)?,
        None => ctx.session.current_folder().cloned(),
    };
    print_folder(&ctx, folder.as_ref())
}

fn cmd_cd(args: CdArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open(start, json)?;
    ctx.require_project()?;
    let folder = ctx.folder(&args.target)?;
    ctx.session.navigate_to(folder)?;
    ctx.save_state()?;
    print_location(&ctx)
}

fn cmd_back(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open(start, json)?;
    ctx.require_project()?;
    if !ctx.session.back() {
        return warn("no earlier folder to go back to");
    }
    ctx.save_state()?;
    print_location(&ctx)
}

fn cmd_pwd(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_project()?;
    print_location(&ctx)
}

fn cmd_view(args: ViewArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open(start, json)?;
    ctx.require_project()?;
    let mode = match args.mode.as_str() {
        "flat" => ViewMode::Flat,
        _ => ViewMode::Hierarchy,
    };
    ctx.session.set_view(mode);
    ctx.save_state()?;
    if json {
        print_location(&ctx)
    } else {
        println!("View: {}", args.mode);
        Ok(())
    }
}

/// Open the folder holding an item and switch to the hierarchy view.
fn cmd_reveal(args: RevealArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open(start, json)?;
    ctx.require_project()?;
    let id = ctx.item(&args.item)?.id.clone();
    ctx.session.reveal(id.as_str())?;
    ctx.save_state()?;
    print_folder(&ctx, ctx.session.current_folder())
}

fn cmd_flat(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_project()?;
    print_flat(&ctx)
}

fn cmd_search(args: SearchArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_project()?;
    let re = search::build_matcher(&args.query, args.regex)
        .map_err(|e| format!("invalid regex: {}", e))?;
    let Some(re) = re else {
        return warn("empty search query");
    };
    let items = ctx.session.items();
    let hits = search::search_items(items, &re);

    if json {
        let mut out = Vec::new();
        for hit in &hits {
            out.extend(search_hit_to_json(items, hit)?);
        }
        return print_json(&out);
    }

    let mut shown: Vec<&ItemId> = Vec::new();
    for hit in &hits {
        if shown.contains(&&hit.item_id) {
            continue;
        }
        shown.push(&hit.item_id);
        if let Some(item) = items.get(hit.item_id.as_str()) {
            println!("{}", format_located_line(items, item));
        }
    }
    if shown.is_empty() {
        println!("No matches for \"{}\"", args.query);
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_project()?;
    let item = ctx.item(&args.item)?;
    let items = ctx.session.items();
    if json {
        return print_json(&item_to_json(items, item)?);
    }
    let path = ctx.session.path(item.id.as_str())?;
    let children = ctx.session.children(Some(item.id.as_str()));
    print_lines(format_item_detail(item, &path, &children));
    Ok(())
}

fn cmd_tree(args: TreeArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_project()?;
    let folder = match &args.folder {
        Some(reference) => ctx.folder(reference)?,
        None => ctx.session.current_folder().cloned(),
    };
    let items = ctx.session.items();
    if json {
        return print_json(&tree_to_json(items, folder.as_ref().map(|f| f.as_str()))?);
    }
    let folder_item = folder.as_ref().and_then(|f| items.get(f.as_str()));
    print_lines(format_tree(items, folder_item)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open_locked(start, json)?;
    ctx.require_project()?;
    let parent = match &args.folder {
        Some(reference) => ctx.folder(reference)?,
        None => ctx.session.current_folder().cloned(),
    };
    let mut draft = ItemDraft::new(args.name.unwrap_or_default()).in_folder(parent);
    if let Some(note) = args.note {
        draft = draft.with_note(note);
    }
    if let Some(file) = &args.image {
        draft = draft.with_image_url(ctx.upload(file)?);
    }

    let outcome = match ctx.session.add_item(draft) {
        Ok(outcome) => outcome,
        Err(e) => return warn(e),
    };
    let Some(item) = settled(outcome, "add")? else {
        return Ok(());
    };
    ctx.save_state()?;

    if json {
        print_json(&item_to_json(ctx.session.items(), &item)?)
    } else {
        println!("{}", item.id);
        Ok(())
    }
}

fn cmd_edit(args: EditArgs, start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open_locked(start, json)?;
    ctx.require_project()?;
    let id = ctx.item(&args.item)?.id.clone();

    let mut changes = ItemChanges {
        name: args.name,
        ..Default::default()
    };
    if let Some(note) = args.note {
        changes.note = Some(Some(note));
    } else if args.clear_note {
        changes.note = Some(None);
    }
    if let Some(file) = &args.image {
        changes.image_url = Some(Some(ctx.upload(file)?));
    } else if args.clear_image {
        changes.image_url = Some(None);
    }

    let outcome = match ctx.session.update_item(id.as_str(), changes) {
        Ok(outcome) => outcome,
        Err(e) => return warn(e),
    };
    if settled(outcome, "edit")?.is_none() {
        return warn("nothing to change");
    }

    let item = ctx
        .session
        .item(id.as_str())
        .ok_or_else(|| format!("item not found: {}", id))?;
    if json {
        print_json(&item_to_json(ctx.session.items(), item)?)
    } else {
        println!("{} updated", item.name);
        Ok(())
    }
}

fn cmd_mv(args: MvArgs, start: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open_locked(start, false)?;
    ctx.require_project()?;
    let id = ctx.item(&args.item)?.id.clone();
    let target = ctx.folder(&args.folder)?;

    let outcome = match ctx.session.move_item(id.as_str(), target.as_ref().map(|t| t.as_str())) {
        Ok(outcome) => outcome,
        Err(e) => return warn(e),
    };
    if settled(outcome, "move")?.is_none() {
        return warn("an item cannot be moved into itself");
    }
    ctx.save_state()?;

    let name = ctx.session.item(id.as_str()).map(|i| i.name.clone()).unwrap_or_default();
    let dest = ctx.session.path(id.as_str())?;
    println!("{} → {}", name, format_breadcrumb(&dest));
    Ok(())
}

fn cmd_rm(args: RmArgs, start: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open_locked(start, false)?;
    ctx.require_project()?;
    let item = ctx.item(&args.item)?;
    let (id, name) = (item.id.clone(), item.name.clone());

    let outcome = match ctx.session.delete_item(id.as_str()) {
        Ok(outcome) => outcome,
        Err(e) => return warn(e),
    };
    let Some(count) = settled(outcome, "delete")? else {
        return Ok(());
    };
    ctx.save_state()?;

    match count {
        1 => println!("Deleted {}", name),
        2 => println!("Deleted {} and 1 item inside it", name),
        n => println!("Deleted {} and {} items inside it", name, n - 1),
    }
    Ok(())
}

fn cmd_seed(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut ctx = Context::open_locked(start, json)?;
    ctx.require_project()?;
    let report = match demo::seed(&mut ctx.session) {
        Ok(report) => report,
        Err(e) => return warn(e),
    };
    ctx.save_state()?;

    if json {
        print_json(&serde_json::json!({
            "created": report.created,
            "skipped": report.skipped,
        }))
    } else {
        println!("Seeded {} items", report.created);
        if report.skipped > 0 {
            eprintln!("warning: {} items were not created", report.skipped);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

fn cmd_check(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(start, json)?;
    ctx.require_project()?;
    let result = check::check_items(ctx.session.items());
    if json {
        return print_json(&result);
    }
    print_lines(format_check(&result));
    Ok(())
}
