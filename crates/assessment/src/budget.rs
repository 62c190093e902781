//! PromptBudgetAssembler: fit dynamic content into a fixed character budget.
//!
//! A prompt is a [`PromptTemplate`] (static text with `{{label}}` slots) plus
//! a set of [`PromptBlock`]s. Static text is fixed overhead and is never cut.
//! Whatever is left is distributed in two phases:
//!
//! 1. **Shrinkable** blocks (retrieved context) are placed first, in ascending
//!    priority. A block that fits in the remaining budget is kept whole. One
//!    that does not is cut so that everything still unplaced could fit, but
//!    never below its floor (or the remaining budget, if smaller).
//! 2. **Share** blocks (profile, answers, risk table) split what is left by
//!    fixed proportional weights. If they fit together, nothing is cut;
//!    otherwise each is independently hard-cut to its share.
//!
//! The output never exceeds the limit. If the static text alone is too long,
//! the rendered prompt is hard-cut to the limit and a warning is logged.
//! Budgets are counted in `char`s.

use riskiq_core::text::{char_len, truncate_chars};
use serde::Serialize;
use tracing::{info, warn};

/// How a block gives way when the budget is tight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Allocation {
    /// Shrunk first, down to `floor` characters.
    Shrinkable { floor: usize },
    /// Receives this relative share of what the shrinkable blocks leave.
    Share(f32),
}

#[derive(Debug, Clone)]
pub struct PromptBlock {
    pub label: String,
    /// Lower values are truncated first among shrinkable blocks.
    pub priority: u8,
    pub content: String,
    pub allocation: Allocation,
}

impl PromptBlock {
    pub fn shrinkable(label: impl Into<String>, priority: u8, content: impl Into<String>, floor: usize) -> Self {
        Self {
            label: label.into(),
            priority,
            content: content.into(),
            allocation: Allocation::Shrinkable { floor },
        }
    }

    pub fn share(label: impl Into<String>, priority: u8, content: impl Into<String>, share: f32) -> Self {
        Self {
            label: label.into(),
            priority,
            content: content.into(),
            allocation: Allocation::Share(share),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Static(String),
    Slot(String),
}

/// Static prompt text with `{{label}}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    static_chars: usize,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            match after.find("}}") {
                Some(close) if is_label(&after[..close]) => {
                    literal.push_str(&rest[..open]);
                    if !literal.is_empty() {
                        segments.push(Segment::Static(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(after[..close].to_string()));
                    rest = &after[close + 2..];
                }
                _ => {
                    literal.push_str(&rest[..open + 2]);
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Static(literal));
        }

        let static_chars = segments
            .iter()
            .map(|s| match s {
                Segment::Static(text) => char_len(text),
                Segment::Slot(_) => 0,
            })
            .sum();
        Self { segments, static_chars }
    }

    /// Characters of fixed overhead.
    pub fn static_chars(&self) -> usize {
        self.static_chars
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(label) => Some(label.as_str()),
            Segment::Static(_) => None,
        })
    }
}

fn is_label(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockStats {
    pub label: String,
    pub original_chars: usize,
    pub final_chars: usize,
}

/// What the assembler did, for logging and for callers that track overflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetReport {
    pub limit: usize,
    pub static_chars: usize,
    pub total_chars: usize,
    pub blocks: Vec<BlockStats>,
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub text: String,
    pub report: BudgetReport,
}

/// Stateless; create one per limit and reuse it.
#[derive(Debug, Clone, Copy)]
pub struct PromptBudgetAssembler {
    limit: usize,
}

impl PromptBudgetAssembler {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn assemble(&self, template: &PromptTemplate, blocks: &[PromptBlock]) -> AssembledPrompt {
        let lengths: Vec<usize> = blocks.iter().map(|b| char_len(&b.content)).collect();
        let mut caps = lengths.clone();
        let mut remaining = self.limit.saturating_sub(template.static_chars());

        // Phase 1: shrinkable blocks, lowest priority first.
        let mut shrinkable: Vec<usize> = (0..blocks.len())
            .filter(|&i| matches!(blocks[i].allocation, Allocation::Shrinkable { .. }))
            .collect();
        shrinkable.sort_by_key(|&i| blocks[i].priority);
        let mut placed = vec![false; blocks.len()];
        for &i in &shrinkable {
            let Allocation::Shrinkable { floor } = blocks[i].allocation else {
                continue;
            };
            if lengths[i] > remaining {
                let unplaced: usize = (0..blocks.len())
                    .filter(|&j| j != i && !placed[j])
                    .map(|j| lengths[j])
                    .sum();
                caps[i] = remaining.saturating_sub(unplaced).max(floor.min(remaining));
            }
            remaining -= caps[i];
            placed[i] = true;
        }

        // Phase 2: proportional shares of the leftover.
        let shared: Vec<(usize, f32)> = (0..blocks.len())
            .filter_map(|i| match blocks[i].allocation {
                Allocation::Share(s) => Some((i, s.max(0.0))),
                Allocation::Shrinkable { .. } => None,
            })
            .collect();
        let demand: usize = shared.iter().map(|&(i, _)| lengths[i]).sum();
        if demand > remaining {
            let portions = split_by_share(remaining, &shared);
            for (&(i, _), portion) in shared.iter().zip(portions) {
                caps[i] = lengths[i].min(portion);
            }
        }

        let mut text = String::with_capacity(self.limit.min(template.static_chars() + demand));
        for segment in &template.segments {
            match segment {
                Segment::Static(s) => text.push_str(s),
                Segment::Slot(label) => {
                    if let Some(i) = blocks.iter().position(|b| &b.label == label) {
                        text.push_str(truncate_chars(&blocks[i].content, caps[i]));
                    }
                }
            }
        }

        let mut truncated = caps.iter().zip(&lengths).any(|(c, l)| c < l);
        let mut total_chars = char_len(&text);
        if total_chars > self.limit {
            warn!(
                limit = self.limit,
                static_chars = template.static_chars(),
                "Static prompt text exceeds the budget; hard-cutting the prompt"
            );
            text = truncate_chars(&text, self.limit).to_string();
            total_chars = self.limit;
            truncated = true;
        }

        let report = BudgetReport {
            limit: self.limit,
            static_chars: template.static_chars(),
            total_chars,
            blocks: blocks
                .iter()
                .zip(lengths.iter().zip(&caps))
                .map(|(b, (&original, &cap))| BlockStats {
                    label: b.label.clone(),
                    original_chars: original,
                    final_chars: cap,
                })
                .collect(),
            truncated,
        };

        if truncated {
            warn!(
                total_chars,
                limit = self.limit,
                blocks = ?report.blocks,
                "Prompt content truncated to fit budget"
            );
        } else {
            info!(total_chars, limit = self.limit, "Prompt assembled within budget");
        }

        AssembledPrompt { text, report }
    }
}

/// Floor of each block's proportional share of `budget`. The portions never
/// sum past `budget`.
fn split_by_share(budget: usize, shared: &[(usize, f32)]) -> Vec<usize> {
    if shared.is_empty() {
        return Vec::new();
    }
    let total: f64 = shared.iter().map(|&(_, s)| f64::from(s)).sum();
    let mut portions: Vec<usize> = shared
        .iter()
        .map(|&(_, s)| {
            if total > 0.0 {
                // f32 shares such as 0.2 are not exact; absorb the representation error.
                (budget as f64 * f64::from(s) / total + 1e-6).floor() as usize
            } else {
                budget / shared.len()
            }
        })
        .collect();
    let mut excess = portions.iter().sum::<usize>().saturating_sub(budget);
    while excess > 0 {
        if let Some(largest) = portions.iter_mut().max() {
            *largest -= 1;
        }
        excess -= 1;
    }
    portions
}
