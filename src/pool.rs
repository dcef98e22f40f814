use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use crate::overrides::NarrativeField;
use serde_json::Value;
use std::collections::BTreeMap;

/// One row of the workflow plan table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub time: String,
    pub task: String,
    pub equipment: String,
    pub communication: String,
}

impl WorkflowStep {
    pub fn new(
        time: impl Into<String>,
        task: impl Into<String>,
        equipment: impl Into<String>,
        communication: impl Into<String>,
    ) -> Self {
        Self {
            time: time.into(),
            task: task.into(),
            equipment: equipment.into(),
            communication: communication.into(),
        }
    }
}

/// A resolved pool lookup: the candidates plus the key its usage history lives under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRef<'a> {
    pub history_key: Cow<'a, str>,
    pub candidates: &'a [String],
}

/// Candidate content, read-only once loaded.
///
/// Pool files are a mapping from category name to candidates. A value may be
/// a list of texts (a general category), a kind -> text(s) map (a kind-scoped
/// category), or a list of workflow rows under `workflow_<kind>`.
/// `workflow_timeline` holds the clock times shared by every kind and
/// `workflow_timeline_<kind>` those of one kind. The nested
/// sections written by `Serialize` (`categories`, `by_kind`, `workflows`,
/// `timelines`, `timeline`) are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, serde_json::Value>")]
pub struct ContentPools {
    pub categories: BTreeMap<String, Vec<String>>,
    /// kind -> category -> candidates; shadows `categories` for slots of that kind.
    pub by_kind: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// Canonical workflow sequence per kind.
    pub workflows: BTreeMap<String, Vec<WorkflowStep>>,
    /// Clock time per workflow row, per kind.
    pub timelines: BTreeMap<String, Vec<String>>,
    /// Clock times for kinds without their own timeline.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PoolEntry {
    Texts(Vec<String>),
    Rows(Vec<WorkflowStep>),
    PerKind(BTreeMap<String, OneOrMany>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(text) => vec![text],
            OneOrMany::Many(texts) => texts,
        }
    }
}

impl TryFrom<BTreeMap<String, Value>> for ContentPools {
    type Error = String;

    fn try_from(raw: BTreeMap<String, Value>) -> Result<Self, Self::Error> {
        let mut pools = ContentPools::new();
        for (key, value) in raw {
            pools
                .absorb(&key, value)
                .map_err(|err| format!("content pool '{key}': {err}"))?;
        }
        Ok(pools)
    }
}

impl ContentPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category<I, S>(mut self, category: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .insert(category.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_kind_category<I, S>(
        mut self,
        kind: impl Into<String>,
        category: impl Into<String>,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_kind
            .entry(kind.into())
            .or_default()
            .insert(category.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_workflow(mut self, kind: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        self.workflows.insert(kind.into(), steps);
        self
    }

    pub fn with_timeline<I, S>(mut self, kind: impl Into<String>, times: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timelines
            .insert(kind.into(), times.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.by_kind.is_empty()
            && self.workflows.is_empty()
            && self.timelines.is_empty()
            && self.timeline.is_empty()
    }

    fn absorb(&mut self, key: &str, value: Value) -> serde_json::Result<()> {
        match key {
            "categories" => {
                let categories: BTreeMap<String, Vec<String>> = serde_json::from_value(value)?;
                self.categories.extend(categories);
            }
            "by_kind" => {
                let sections: BTreeMap<String, BTreeMap<String, Vec<String>>> =
                    serde_json::from_value(value)?;
                for (kind, categories) in sections {
                    self.by_kind.entry(kind).or_default().extend(categories);
                }
            }
            "workflows" => {
                let workflows: BTreeMap<String, Vec<WorkflowStep>> = serde_json::from_value(value)?;
                self.workflows.extend(workflows);
            }
            "timelines" => {
                let timelines: BTreeMap<String, Vec<String>> = serde_json::from_value(value)?;
                self.timelines.extend(timelines);
            }
            "timeline" | "workflow_timeline" => self.timeline = serde_json::from_value(value)?,
            _ if key.starts_with("workflow_timeline_") => {
                let kind = &key["workflow_timeline_".len()..];
                self.timelines
                    .insert(kind.to_string(), serde_json::from_value(value)?);
            }
            _ => match serde_json::from_value::<PoolEntry>(value)? {
                PoolEntry::Texts(texts) => {
                    self.categories.insert(category_name(key), texts);
                }
                PoolEntry::Rows(rows) => {
                    let kind = key.strip_prefix("workflow_").unwrap_or(key);
                    self.workflows.insert(kind.to_string(), rows);
                }
                PoolEntry::PerKind(per_kind) => {
                    let category = category_name(key);
                    for (kind, texts) in per_kind {
                        self.by_kind
                            .entry(kind)
                            .or_default()
                            .insert(category.clone(), texts.into_vec());
                    }
                }
            },
        }
        Ok(())
    }

    /// Kind-scoped pool first, then the general category.
    pub fn lookup<'a>(&'a self, category: &'a str, kind: &str) -> Option<PoolRef<'a>> {
        if let Some(candidates) = self.by_kind.get(kind).and_then(|c| c.get(category)) {
            return Some(PoolRef {
                history_key: Cow::Owned(format!("{category}@{kind}")),
                candidates,
            });
        }
        self.categories.get(category).map(|candidates| PoolRef {
            history_key: Cow::Borrowed(category),
            candidates,
        })
    }

    pub fn category(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn workflow(&self, kind: &str) -> Option<&[WorkflowStep]> {
        self.workflows.get(kind).map(Vec::as_slice)
    }

    pub fn timeline_slot(&self, kind: &str, row: usize) -> Option<&str> {
        self.timelines
            .get(kind)
            .unwrap_or(&self.timeline)
            .get(row)
            .map(String::as_str)
    }

    /// Built-in pools used when no pool file is present.
    pub fn builtin() -> Self {
        Self::new()
            .with_kind_category(
                "lunch",
                "prepared_for_service",
                [
                    "Checked the lunch station, stocked the line fridges and confirmed the specials board with the sous chef.",
                ],
            )
            .with_kind_category(
                "dinner",
                "prepared_for_service",
                [
                    "Reset the station after lunch, restocked mise en place and checked the dinner bookings for dietary notes.",
                ],
            )
            // kinds configured beyond lunch and dinner
            .with_category(
                "prepared_for_service",
                [
                    "Checked equipment, organised ingredients and sanitised all surfaces before service.",
                    "Completed mise en place, tested oven temperatures and laid out utensils.",
                    "Checked stock levels, prepped fresh produce and organised the workstation.",
                ],
            )
            .with_category(
                "special_requests",
                [
                    "Guest requested a gluten-free meal with the sauce on the side.",
                    "Steak ordered well done with extra vegetables instead of chips.",
                    "Vegetarian guest; swapped the protein for grilled halloumi.",
                    "Nut allergy flagged on the docket; prepared on a clean board.",
                ],
            )
            .with_category(
                "food_details",
                [
                    "Prepared burgers, hand-cut chips and fresh garden salads.",
                    "Worked the grill on steaks, risotto and seasonal mains.",
                    "Focused on soups, fresh pasta and plated desserts.",
                    "Portioned and cooked fish specials with a beurre blanc.",
                ],
            )
            .with_category(
                "complaints",
                [
                    "A guest said their main arrived lukewarm.",
                    "Demand was higher than expected during the peak hour.",
                    "The fryer lost temperature briefly mid-service.",
                ],
            )
            .with_category(
                "solutions",
                [
                    "Re-fired the dish immediately and adjusted the pass timing.",
                    "Reorganised the workflow and called tickets more clearly to the team.",
                    "Moved fried items to the backup fryer until maintenance checked it.",
                ],
            )
            .with_category(
                "debrief",
                [
                    "Learned how much temperature control and teamwork matter on the pass.",
                    "Improved my organisation and communication under pressure.",
                    "Worked on coordinating plate timing with front of house.",
                ],
            )
            .with_category(
                "handover",
                [
                    "Handed over all open orders and prep lists to the next shift.",
                    "Briefed the incoming cook on pending special requests.",
                    "Reported equipment status and stock levels at handover.",
                ],
            )
            .with_category(
                "customer_feedback",
                [
                    "Guests praised the quality of ingredients and presentation.",
                    "Positive comments about ticket times and flavour.",
                    "A table thanked the kitchen for handling their allergy carefully.",
                ],
            )
            .with_category(
                "workflow_tasks",
                [
                    "Check equipment and station setup",
                    "Mise en place preparation",
                    "Service preparation",
                    "Peak service management",
                    "Order completion and quality check",
                    "Station cleaning and sanitising",
                    "Handover preparation",
                    "Final checks and departure",
                ],
            )
            .with_category(
                "workflow_equipment",
                [
                    "Grill / fryer / prep benches",
                    "Knives / cutting boards / containers",
                    "All cooking equipment / safety gloves",
                    "Probe thermometer / plating equipment",
                    "Cleaning supplies / sanitiser",
                    "Clipboards / logbooks",
                ],
            )
            .with_category(
                "workflow_communication",
                [
                    "Head chef about daily specials",
                    "Sous chef about ingredient availability",
                    "Wait staff about special requirements",
                    "Kitchen team about order priorities",
                    "Next shift about ongoing orders",
                    "Supervisor about shift completion",
                ],
            )
            .with_timeline(
                "lunch",
                ["10:30", "11:00", "12:00", "13:00", "14:00", "15:00", "15:30", "16:00"],
            )
            .with_timeline(
                "dinner",
                ["16:00", "17:00", "18:00", "19:00", "20:00", "21:00", "21:30", "22:00"],
            )
    }
}

/// Legacy field spellings (`complaints_problems`) name the field's own category.
fn category_name(key: &str) -> String {
    NarrativeField::from_key(key).map_or(key, |field| field.key()).to_string()
}
