use serde::Serialize;
use uuid::Uuid;

use crate::granularity::Granularity;
use crate::interval::DateInterval;
use crate::source::CalendarItem;

/// A bucket of items covering one interval.
///
/// `context` records why the bucket exists (the title it groups, or the
/// step that produced its interval). `items` is either raw calendar items
/// or nested summaries, depending on how the type is instantiated.
///
/// `id` is a fresh identity for presentation only; equality ignores it.
#[derive(Debug, Clone, Serialize)]
pub struct Summary<C, I> {
    pub id: Uuid,
    pub date_interval: DateInterval,
    pub context: C,
    pub items: Vec<I>,
}

/// Leaf level: the items sharing one title.
pub type TitleSummary = Summary<String, CalendarItem>;

/// One sub-interval produced by stepping at a granularity.
pub type PeriodSummary<I> = Summary<Granularity, I>;

impl<C, I> Summary<C, I> {
    pub fn new(date_interval: DateInterval, context: C, items: Vec<I>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_interval,
            context,
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the children while keeping identity, interval and context.
    pub fn map_items<J>(self, f: impl FnMut(I) -> J) -> Summary<C, J> {
        Summary {
            id: self.id,
            date_interval: self.date_interval,
            context: self.context,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

impl<C: PartialEq, I: PartialEq> PartialEq for Summary<C, I> {
    fn eq(&self, other: &Self) -> bool {
        self.date_interval == other.date_interval
            && self.context == other.context
            && self.items == other.items
    }
}

impl<C: Eq, I: Eq> Eq for Summary<C, I> {}

/// A node in a summary tree of caller-chosen depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryNode {
    Period(PeriodSummary<SummaryNode>),
    Group(TitleSummary),
}

impl SummaryNode {
    pub fn date_interval(&self) -> &DateInterval {
        match self {
            Self::Period(summary) => &summary.date_interval,
            Self::Group(summary) => &summary.date_interval,
        }
    }

    pub fn as_period(&self) -> Option<&PeriodSummary<SummaryNode>> {
        match self {
            Self::Period(summary) => Some(summary),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&TitleSummary> {
        match self {
            Self::Group(summary) => Some(summary),
            Self::Period(_) => None,
        }
    }
}

/// Number of calendar items reachable below a value.
pub trait ItemCount {
    fn item_count(&self) -> usize;
}

impl ItemCount for CalendarItem {
    fn item_count(&self) -> usize {
        1
    }
}

impl<C, I: ItemCount> ItemCount for Summary<C, I> {
    fn item_count(&self) -> usize {
        self.items.iter().map(ItemCount::item_count).sum()
    }
}

impl ItemCount for SummaryNode {
    fn item_count(&self) -> usize {
        match self {
            Self::Period(summary) => summary.item_count(),
            Self::Group(summary) => summary.item_count(),
        }
    }
}

impl<T: ItemCount> ItemCount for [T] {
    fn item_count(&self) -> usize {
        self.iter().map(ItemCount::item_count).sum()
    }
}

impl<T: ItemCount> ItemCount for Vec<T> {
    fn item_count(&self) -> usize {
        self.as_slice().item_count()
    }
}
