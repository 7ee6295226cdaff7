//! Link groups shown on the index page.
//!
//! A group is either a stored category or the synthetic "hot" group built from
//! click counts. Both expose the same read-only view through [`NamedLinks`].

use crate::db::{DbCategory, DbLink};
use serde::Serialize;
use std::collections::HashMap;

pub const HOT_GROUP_KEY: &str = "hot";
pub const HOT_GROUP_NAME: &str = "🔥 热门工具";
pub const HOT_GROUP_SIZE: usize = 10;

/// A named, ordered collection of links.
pub trait NamedLinks {
    fn key(&self) -> String;
    fn name(&self) -> &str;
    fn links(&self) -> &[DbLink];

    fn count(&self) -> usize {
        self.links().len()
    }
}

#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub category: DbCategory,
    pub links: Vec<DbLink>,
}

impl NamedLinks for CategoryGroup {
    fn key(&self) -> String {
        self.category.id.to_string()
    }

    fn name(&self) -> &str {
        &self.category.name
    }

    fn links(&self) -> &[DbLink] {
        &self.links
    }
}

#[derive(Debug, Clone)]
pub struct HotGroup {
    pub links: Vec<DbLink>,
}

impl NamedLinks for HotGroup {
    fn key(&self) -> String {
        HOT_GROUP_KEY.to_string()
    }

    fn name(&self) -> &str {
        HOT_GROUP_NAME
    }

    fn links(&self) -> &[DbLink] {
        &self.links
    }
}

#[derive(Debug, Clone)]
pub enum LinkGroup {
    Category(CategoryGroup),
    Hot(HotGroup),
}

impl LinkGroup {
    fn inner(&self) -> &dyn NamedLinks {
        match self {
            LinkGroup::Category(g) => g,
            LinkGroup::Hot(g) => g,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, LinkGroup::Hot(_))
    }

    pub fn view(&self) -> GroupView<'_> {
        let inner = self.inner();
        GroupView {
            key: inner.key(),
            name: inner.name(),
            synthetic: self.is_synthetic(),
            count: inner.count(),
            links: inner.links(),
        }
    }
}

impl NamedLinks for LinkGroup {
    fn key(&self) -> String {
        self.inner().key()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn links(&self) -> &[DbLink] {
        self.inner().links()
    }
}

/// Template-facing projection of a group.
#[derive(Debug, Serialize)]
pub struct GroupView<'a> {
    pub key: String,
    pub name: &'a str,
    pub synthetic: bool,
    pub count: usize,
    pub links: &'a [DbLink],
}

/// Top `n` links by clicks, descending; ties go to the lower id.
pub fn rank_hot_links(links: &[DbLink], n: usize) -> Vec<DbLink> {
    let mut ranked: Vec<&DbLink> = links.iter().collect();
    ranked.sort_by(|a, b| b.clicks.cmp(&a.clicks).then(a.id.cmp(&b.id)));
    ranked.into_iter().take(n).cloned().collect()
}

/// Attach links to their categories, keeping category order and link id order.
pub fn group_by_category(categories: Vec<DbCategory>, links: &[DbLink]) -> Vec<CategoryGroup> {
    let mut by_category: HashMap<i64, Vec<DbLink>> = HashMap::new();
    for link in links {
        by_category.entry(link.category_id).or_default().push(link.clone());
    }
    categories
        .into_iter()
        .map(|category| {
            let mut links = by_category.remove(&category.id).unwrap_or_default();
            links.sort_by_key(|l| l.id);
            CategoryGroup { category, links }
        })
        .collect()
}

/// Index page groups: the hot group first (only when any link exists), then categories.
pub fn build_groups(categories: Vec<DbCategory>, links: &[DbLink]) -> Vec<LinkGroup> {
    let hot = rank_hot_links(links, HOT_GROUP_SIZE);
    let mut groups = Vec::with_capacity(categories.len() + 1);
    if !hot.is_empty() {
        groups.push(LinkGroup::Hot(HotGroup { links: hot }));
    }
    groups.extend(
        group_by_category(categories, links)
            .into_iter()
            .map(LinkGroup::Category),
    );
    groups
}
