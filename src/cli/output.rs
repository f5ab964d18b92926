use serde::Serialize;

use crate::model::item::{Item, ItemSet};
use crate::model::project::Project;
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::ops::navigation::ViewMode;
use crate::ops::search::SearchHit;
use crate::ops::tree::{self, TreeError};
use crate::util::unicode::{pad_to_width, single_line, truncate_to_width};

/// Width of the name column in listings
const NAME_COLUMN: usize = 28;
/// Longest note excerpt shown in listings
const NOTE_EXCERPT: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemJson<'a> {
    #[serde(flatten)]
    pub item: &'a Item,
    pub is_folder: bool,
    pub child_count: usize,
    /// Names of the ancestors, root-most first
    pub path: Vec<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderJson<'a> {
    /// `None` for the project root
    pub folder: Option<ItemJson<'a>>,
    pub path: Vec<CrumbJson<'a>>,
    pub children: Vec<ItemJson<'a>>,
}

#[derive(Serialize)]
pub struct CrumbJson<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectJson<'a> {
    #[serde(flatten)]
    pub project: &'a Project,
    pub current: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationJson<'a> {
    pub project: Option<&'a str>,
    pub path: Vec<CrumbJson<'a>>,
    pub view: ViewMode,
    pub history_depth: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitJson<'a> {
    pub item_id: &'a str,
    pub name: &'a str,
    pub field: &'static str,
    pub path: Vec<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNodeJson<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub children: Vec<TreeNodeJson<'a>>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn item_to_json<'a>(items: &'a ItemSet, item: &'a Item) -> Result<ItemJson<'a>, TreeError> {
    let count = tree::child_count(items, item.id.as_str());
    Ok(ItemJson {
        item,
        is_folder: count > 0,
        child_count: count,
        path: tree::path_of(items, item.id.as_str())?
            .into_iter()
            .map(|i| i.name.as_str())
            .collect(),
    })
}

pub fn crumbs<'a>(path: &[&'a Item]) -> Vec<CrumbJson<'a>> {
    path.iter()
        .map(|i| CrumbJson {
            id: i.id.as_str(),
            name: i.name.as_str(),
        })
        .collect()
}

/// Nested rendering of `folder` and everything below it
pub fn tree_to_json<'a>(items: &'a ItemSet, folder: Option<&str>) -> Result<Vec<TreeNodeJson<'a>>, TreeError> {
    if let Some(id) = folder {
        tree::descendants_of(items, id)?;
    }
    Ok(tree_nodes(items, folder))
}

fn tree_nodes<'a>(items: &'a ItemSet, folder: Option<&str>) -> Vec<TreeNodeJson<'a>> {
    tree::children_of(items, folder)
        .into_iter()
        .map(|child| TreeNodeJson {
            id: child.id.as_str(),
            name: child.name.as_str(),
            children: tree_nodes(items, Some(child.id.as_str())),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// First 8 characters of an id; enough to refer to an item on the command line
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// `/Living Room/TV Stand`, or `/` for the root
pub fn format_breadcrumb(path: &[&Item]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter().map(|i| format!("/{}", i.name)).collect()
}

/// One listing line: id, name (folders end in `/`), then child count, note
/// excerpt and photo marker.
pub fn format_item_line(item: &Item, child_count: usize) -> String {
    let name = if child_count > 0 {
        format!("{}/", item.name)
    } else {
        item.name.clone()
    };
    let mut line = format!("{:<8}  {}", short_id(item.id.as_str()), pad_to_width(&name, NAME_COLUMN));
    if child_count > 0 {
        let noun = if child_count == 1 { "item" } else { "items" };
        line.push_str(&format!("  {} {}", child_count, noun));
    }
    if let Some(note) = item.note.as_deref().filter(|n| !n.trim().is_empty()) {
        line.push_str(&format!("  \"{}\"", truncate_to_width(&single_line(note), NOTE_EXCERPT)));
    }
    if item.image_url.is_some() {
        line.push_str("  [photo]");
    }
    line.trim_end().to_string()
}

/// A folder listing: breadcrumb header, then one line per child.
pub fn format_listing(items: &ItemSet, path: &[&Item], children: &[&Item]) -> Vec<String> {
    let mut lines = vec![format_breadcrumb(path)];
    if children.is_empty() {
        lines.push("  (empty)".to_string());
    }
    for child in children {
        let count = tree::child_count(items, child.id.as_str());
        lines.push(format!("  {}", format_item_line(child, count)));
    }
    lines
}

/// Items with their location, as shown by `flat` and `search`.
pub fn format_located_line(items: &ItemSet, item: &Item) -> String {
    let location = match tree::path_of(items, item.id.as_str()) {
        Ok(path) => format_breadcrumb(&path),
        Err(TreeError::CycleDetected(_)) => "(cycle)".to_string(),
    };
    let count = tree::child_count(items, item.id.as_str());
    format!("{}  in {}", format_item_line(item, count), location)
}

/// Indented subtree under `folder` (`None` = whole project).
pub fn format_tree(items: &ItemSet, folder: Option<&Item>) -> Result<Vec<String>, TreeError> {
    let mut lines = Vec::new();
    let start = match folder {
        Some(item) => {
            tree::descendants_of(items, item.id.as_str())?;
            let mut path = tree::path_of(items, item.id.as_str())?;
            path.push(item);
            lines.push(format_breadcrumb(&path));
            Some(item.id.as_str())
        }
        None => {
            lines.push("/".to_string());
            None
        }
    };
    push_tree_lines(items, start, 1, &mut lines);
    Ok(lines)
}

fn push_tree_lines(items: &ItemSet, folder: Option<&str>, depth: usize, lines: &mut Vec<String>) {
    for child in tree::children_of(items, folder) {
        let has_children = tree::is_folder(items, child.id.as_str());
        let slash = if has_children { "/" } else { "" };
        lines.push(format!("{}{}{}", "  ".repeat(depth), child.name, slash));
        if has_children {
            push_tree_lines(items, Some(child.id.as_str()), depth + 1, lines);
        }
    }
}

/// Detailed view of one item.
pub fn format_item_detail(item: &Item, path: &[&Item], children: &[&Item]) -> Vec<String> {
    let mut lines = vec![item.name.clone()];
    lines.push(format!("  id:       {}", item.id));
    lines.push(format!("  in:       {}", format_breadcrumb(path)));
    if let Some(note) = &item.note {
        let mut note_lines = note.lines();
        if let Some(first) = note_lines.next() {
            lines.push(format!("  note:     {}", first));
        }
        for rest in note_lines {
            lines.push(format!("            {}", rest));
        }
    }
    if let Some(url) = &item.image_url {
        lines.push(format!("  photo:    {}", url));
    }
    lines.push(format!(
        "  added:    {}",
        item.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if item.id.is_temporary() {
        lines.push("  status:   unconfirmed".to_string());
    }
    if !children.is_empty() {
        lines.push(format!("  contains: {}", children.len()));
        for child in children {
            lines.push(format!("    {}", child.name));
        }
    }
    lines
}

pub fn format_project_line(project: &Project, current: bool) -> String {
    let marker = if current { "*" } else { " " };
    format!(
        "{} {:<8}  {}  (created {})",
        marker,
        short_id(project.id.as_str()),
        project.name,
        project.created_at.format("%Y-%m-%d")
    )
}

pub fn search_hit_to_json<'a>(items: &'a ItemSet, hit: &SearchHit) -> Result<Option<SearchHitJson<'a>>, TreeError> {
    let Some(item) = items.get(hit.item_id.as_str()) else {
        return Ok(None);
    };
    Ok(Some(SearchHitJson {
        item_id: item.id.as_str(),
        name: item.name.as_str(),
        field: hit.field.as_str(),
        path: tree::path_of(items, item.id.as_str())?
            .into_iter()
            .map(|i| i.name.as_str())
            .collect(),
    }))
}

pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        for err in &result.errors {
            match err {
                CheckError::Cycle { item_id, name } => {
                    lines.push(format!("  {} \"{}\" is its own ancestor", short_id(item_id), name));
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Warnings:".to_string());
        for warn in &result.warnings {
            match warn {
                CheckWarning::DanglingParent {
                    item_id,
                    name,
                    parent_id,
                } => lines.push(format!(
                    "  {} \"{}\" points at missing folder {}",
                    short_id(item_id),
                    name,
                    parent_id
                )),
                CheckWarning::Unconfirmed { item_id, name } => lines.push(format!(
                    "  {} \"{}\" was never confirmed by the store",
                    short_id(item_id),
                    name
                )),
                CheckWarning::EmptyName { item_id } => {
                    lines.push(format!("  {} has an empty name", short_id(item_id)));
                }
            }
        }
    }
    if result.valid && result.warnings.is_empty() {
        lines.push("All checks passed.".to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::ItemId;
    use crate::model::project::ProjectId;
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;

    fn item(id: &str, name: &str, parent: Option<&str>) -> Item {
        Item {
            id: ItemId::new(id),
            name: name.to_string(),
            image_url: None,
            note: None,
            parent_id: parent.map(ItemId::from),
            project_id: ProjectId::new("p1"),
            created_at: Utc.with_ymd_and_hms(2025, 5, 14, 9, 30, 0).unwrap(),
        }
    }

    fn house() -> ItemSet {
        let mut batteries = item("batteries-0001", "AA Batteries", Some("drawer-0001"));
        batteries.note = Some("Rechargeable ones".into());
        batteries.image_url = Some("https://img.example/b.jpg".into());
        ItemSet::from_items([
            item("living-0001", "Living Room", None),
            item("stand-0001", "TV Stand", Some("living-0001")),
            item("drawer-0001", "Top Drawer", Some("stand-0001")),
            batteries,
            item("cable-0001", "HDMI Cable", Some("drawer-0001")),
            item("bedroom-0001", "Bedroom", None),
        ])
    }

    fn join(lines: Vec<String>) -> String {
        lines.join("\n")
    }

    #[test]
    fn whole_project_tree() {
        let items = house();
        let out = join(format_tree(&items, None).unwrap());
        assert_snapshot!(out.trim_end(), @r"
/
  Living Room/
    TV Stand/
      Top Drawer/
        AA Batteries
        HDMI Cable
  Bedroom
");
    }

    #[test]
    fn subtree_starts_with_breadcrumb() {
        let items = house();
        let stand = items.get("stand-0001").unwrap();
        let out = join(format_tree(&items, Some(stand)).unwrap());
        assert_snapshot!(out.trim_end(), @r"
/Living Room/TV Stand
  Top Drawer/
    AA Batteries
    HDMI Cable
");
    }

    #[test]
    fn listing_shows_counts_notes_and_photos() {
        let items = house();
        let drawer = items.get("drawer-0001").unwrap();
        let mut path = tree::path_of(&items, "drawer-0001").unwrap();
        path.push(drawer);
        let children = tree::children_of(&items, Some("drawer-0001"));
        let out = join(format_listing(&items, &path, &children));
        assert_snapshot!(out.trim_end(), @r#"
/Living Room/TV Stand/Top Drawer
  batterie  AA Batteries                  "Rechargeable ones"  [photo]
  cable-00  HDMI Cable
"#);

        let roots = tree::children_of(&items, None);
        let out = join(format_listing(&items, &[], &roots));
        assert_snapshot!(out.trim_end(), @r"
/
  living-0  Living Room/                  1 item
  bedroom-  Bedroom
");
    }

    #[test]
    fn empty_folder_listing() {
        let items = house();
        let bedroom = items.get("bedroom-0001").unwrap();
        let out = join(format_listing(&items, &[bedroom], &[]));
        assert_snapshot!(out.trim_end(), @r"
/Bedroom
  (empty)
");
    }

    #[test]
    fn item_detail() {
        let items = house();
        let batteries = items.get("batteries-0001").unwrap();
        let path = tree::path_of(&items, "batteries-0001").unwrap();
        let out = join(format_item_detail(batteries, &path, &[]));
        assert_snapshot!(out.trim_end(), @r"
AA Batteries
  id:       batteries-0001
  in:       /Living Room/TV Stand/Top Drawer
  note:     Rechargeable ones
  photo:    https://img.example/b.jpg
  added:    2025-05-14 09:30 UTC
");
    }

    #[test]
    fn located_line_includes_path() {
        let items = house();
        let cable = items.get("cable-0001").unwrap();
        assert_eq!(
            format_located_line(&items, cable),
            "cable-00  HDMI Cable  in /Living Room/TV Stand/Top Drawer"
        );
    }

    #[test]
    fn located_line_marks_items_on_a_cycle() {
        let mut items = house();
        items.push(item("loop-a", "Loop A", Some("loop-b")));
        items.push(item("loop-b", "Loop B", Some("loop-a")));
        let looped = items.get("loop-a").unwrap();
        let line = format_located_line(&items, looped);
        assert!(line.starts_with("loop-a    Loop A/"));
        assert!(line.ends_with("1 item  in (cycle)"));
        let cable = items.get("cable-0001").unwrap();
        assert!(format_located_line(&items, cable).ends_with("in /Living Room/TV Stand/Top Drawer"));
    }

    #[test]
    fn item_json_is_camel_case_with_path() {
        let items = house();
        let drawer = items.get("drawer-0001").unwrap();
        let json = serde_json::to_value(item_to_json(&items, drawer).unwrap()).unwrap();
        assert_eq!(json["parentId"], "stand-0001");
        assert_eq!(json["isFolder"], true);
        assert_eq!(json["childCount"], 2);
        assert_eq!(json["path"], serde_json::json!(["Living Room", "TV Stand"]));
    }

    #[test]
    fn tree_json_nests_children() {
        let items = house();
        let nodes = tree_to_json(&items, Some("stand-0001")).unwrap();
        let json = serde_json::to_value(nodes).unwrap();
        assert_eq!(json[0]["name"], "Top Drawer");
        assert_eq!(json[0]["children"][1]["name"], "HDMI Cable");
    }

    #[test]
    fn cyclic_tree_is_an_error() {
        let items = ItemSet::from_items([item("a", "A", Some("b")), item("b", "B", Some("a"))]);
        let a = items.get("a").unwrap();
        assert!(format_tree(&items, Some(a)).is_err());
    }

    #[test]
    fn short_ids() {
        assert_eq!(short_id("0123456789"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn check_report() {
        let result = CheckResult {
            valid: false,
            errors: vec![CheckError::Cycle {
                item_id: "a".into(),
                name: "A".into(),
            }],
            warnings: vec![CheckWarning::EmptyName {
                item_id: "b".into(),
            }],
        };
        assert_snapshot!(join(format_check(&result)), @r#"
Errors:
  a "A" is its own ancestor

Warnings:
  b has an empty name
"#);
        assert_eq!(format_check(&CheckResult { valid: true, ..Default::default() }), vec!["All checks passed."]);
    }
}
