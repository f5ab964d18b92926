use crate::io::store::Store;
use crate::model::item::{ItemDraft, ItemId};
use crate::ops::item_ops::MutationError;
use crate::session::{Outcome, Session};

/// One entry of the sample hierarchy
#[derive(Debug, Clone, Copy)]
pub struct DemoNode {
    pub name: &'static str,
    pub note: Option<&'static str>,
    pub image_url: &'static str,
    pub children: &'static [DemoNode],
}

const fn node(name: &'static str, image_url: &'static str, children: &'static [DemoNode]) -> DemoNode {
    DemoNode {
        name,
        note: None,
        image_url,
        children,
    }
}

const UNSPLASH: &str = "https://images.unsplash.com/";

/// Two rooms with furniture, containers and a few things inside.
pub const DEMO_TREE: &[DemoNode] = &[
    node(
        "Living Room",
        "photo-1583847661867-dac18de51a96",
        &[
            node(
                "TV Stand",
                "photo-1593796320384-6b321628a517",
                &[node(
                    "Top Drawer",
                    "photo-1551590192-807e80d7b105",
                    &[
                        DemoNode {
                            name: "AA Batteries",
                            note: Some("Rechargeable ones"),
                            image_url: "photo-1619642034932-8dfb5a932d56",
                            children: &[],
                        },
                        node("HDMI Cable", "photo-1558235252-95f3607063de", &[]),
                    ],
                )],
            ),
            node("Book Shelf", "photo-1594620302200-9a729e1e83a9", &[]),
        ],
    ),
    node(
        "Bedroom",
        "photo-1616594039964-40891a909d9f",
        &[node(
            "Closet",
            "photo-1558997916-d83d37492c48",
            &[node(
                "Winter Box",
                "photo-1582738411706-bfc8e691d1c2",
                &[node("Red Scarf", "photo-1520903920248-2c77df690dfa", &[])],
            )],
        )],
    ),
];

/// What seeding did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    /// Items the store refused, counting the subtrees skipped below them
    pub skipped: usize,
}

/// Insert the sample hierarchy into the current project, one create at a
/// time, parents before children.
pub fn seed<S: Store>(session: &mut Session<S>) -> Result<SeedReport, MutationError> {
    let mut report = SeedReport::default();
    for root in DEMO_TREE {
        seed_node(session, root, None, &mut report)?;
    }
    tracing::debug!(created = report.created, skipped = report.skipped, "demo seeded");
    Ok(report)
}

fn seed_node<S: Store>(
    session: &mut Session<S>,
    node: &DemoNode,
    parent: Option<ItemId>,
    report: &mut SeedReport,
) -> Result<(), MutationError> {
    let mut draft = ItemDraft::new(node.name)
        .with_image_url(format!("{}{}?auto=format&fit=crop&q=80&w=800", UNSPLASH, node.image_url))
        .in_folder(parent);
    if let Some(note) = node.note {
        draft = draft.with_note(note);
    }
    match session.add_item(draft)? {
        Outcome::Confirmed(item) => {
            report.created += 1;
            for child in node.children {
                seed_node(session, child, Some(item.id.clone()), report)?;
            }
        }
        Outcome::Unchanged | Outcome::RolledBack { .. } => {
            report.skipped += count(node);
        }
    }
    Ok(())
}

fn count(node: &DemoNode) -> usize {
    1 + node.children.iter().map(count).sum::<usize>()
}
