// Menu navigation
//
// A menu page lists its declared children in a select; a submenu adds
// "Back" and "Back to top" buttons. The select goes on row 4 unless that
// row is taken (by the submenu buttons or a close button), then row 3.

use super::base::{CallbackOptions, PageBuilder, PageCore};
use super::component::{Component, ComponentId, SelectOption};
use super::hierarchy::{ChildPage, ParentPage};
use super::layout::MAX_ROWS;
use super::switch::switch_to;
use super::Page;
use crate::error::PageResult;
use crate::host::Context;
use crate::util::truncate_chars;
use std::sync::Arc;
use tracing::{debug, error};

pub const MENU_SELECT: ComponentId = ComponentId::new("menu:select");
pub const BACK: ComponentId = ComponentId::new("menu:back");
pub const BACK_TO_TOP: ComponentId = ComponentId::new("menu:top");

const MAX_OPTION_LABEL: usize = 100;
const MAX_OPTION_DESCRIPTION: usize = 100;

const BOTTOM_ROW: u8 = (MAX_ROWS - 1) as u8;

/// A parent page that navigates to its children through a select
pub trait MenuPage: ParentPage {
    const PLACEHOLDER: Option<&'static str> = None;

    /// Add the child select to the page.
    ///
    /// Call once, after construction. The select is not wrapped, so no
    /// refresh runs after a selection.
    fn attach_menu(&self) {
        attach::<Self>(self.core(), self);
    }
}

/// Marker for children that get Back and Back to top buttons
///
/// Implementors call [`PageBuilder::submenu`] while building.
pub trait Submenu: ChildPage {}

fn attach<P: MenuPage>(core: &PageCore, page: &P) {
    let options = page
        .children()
        .declared()
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let entry = spec.entry();
            let mut option = SelectOption::new(
                truncate_chars(entry.name, MAX_OPTION_LABEL),
                index.to_string(),
            );
            if let Some(description) = entry.description {
                option = option.description(truncate_chars(description, MAX_OPTION_DESCRIPTION));
            }
            if let Some(emoji) = entry.emoji {
                option = option.emoji(emoji);
            }
            option
        })
        .collect();

    let bottom_taken = core
        .components()
        .iter()
        .any(|c| c.row == Some(BOTTOM_ROW));
    let row = if core.is_child() || bottom_taken {
        BOTTOM_ROW - 1
    } else {
        BOTTOM_ROW
    };

    core.add_component(
        Component::select(MENU_SELECT, options)
            .placeholder(P::PLACEHOLDER)
            .row(row),
        CallbackOptions::default(),
        |page: Arc<P>, ctx| async move { on_select(page, ctx).await },
    );
}

async fn on_select<P: MenuPage>(page: Arc<P>, ctx: Context) -> PageResult<()> {
    let value = ctx.values().first().cloned().unwrap_or_default();

    let Ok(index) = value.parse::<usize>() else {
        error!(page = page.core().kind(), %value, "menu value is not an index");
        return ctx
            .respond_ephemeral("Selected value is not possible...?")
            .await;
    };

    let Some(child) = page.get_child_at(index)? else {
        error!(page = page.core().kind(), index, "no child for menu value");
        return ctx
            .respond_ephemeral("Could not interpret selected value...")
            .await;
    };

    // The switch only returns once the child ends
    ctx.defer().await?;
    switch_to(child).await?;
    Ok(())
}

impl<P: Submenu> PageBuilder<P> {
    /// Add the Back and Back to top buttons on the bottom row.
    pub fn submenu(self) -> Self {
        self.component_with(
            Component::button(BACK, "Back").row(BOTTOM_ROW),
            CallbackOptions::new().skip_refresh(),
            |page: Arc<P>, ctx| async move {
                ctx.defer().await?;
                page.switch_to_parent().await?;
                Ok(())
            },
        )
        .component_with(
            Component::button(BACK_TO_TOP, "Back to top").row(BOTTOM_ROW),
            CallbackOptions::new().skip_refresh(),
            |page: Arc<P>, ctx| async move {
                ctx.defer().await?;
                let root = top_of(page.core())?;
                switch_to(root).await?;
                Ok(())
            },
        )
    }
}

/// Walk parent links up to the first page that isn't a child
fn top_of(core: &PageCore) -> PageResult<Arc<dyn Page>> {
    let mut node = match core.parent()? {
        Some(parent) => parent,
        None => return core.this().ok_or(crate::error::PageError::Gone(core.kind())),
    };
    let mut depth = 1;
    while let Some(parent) = node.core().parent()? {
        node = parent;
        depth += 1;
    }
    debug!(from = core.kind(), to = node.core().kind(), depth, "back to top");
    Ok(node)
}
