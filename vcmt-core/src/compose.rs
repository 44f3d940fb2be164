//! Narrative statement composition.
//!
//! Pure formatting: a fixed lead-in sentence per entry variant, a fixed
//! transition phrase, then one bullet per matched criterion. The lead-in
//! wording is load-bearing — the exported document is expected to carry
//! these exact sentences — so the templates are reproduced verbatim with
//! only the code/name substituted.

use crate::types::{PartRole, UnitRecord};

pub const TRANSITION_PHRASE: &str = "This included the ability to:";
pub const BULLET_MARKER: char = '•';

/// The fixed lead-in sentence for an entry variant.
pub fn lead_in(role: PartRole, code: &str, name: &str) -> String {
    let code_and_name = join_nonempty(code, name);
    match role {
        PartRole::Qualification => {
            let display = if name.is_empty() { code } else { name };
            format!("Within this qualification, I was required to demonstrate competency in {display}.")
        }
        PartRole::Experience => {
            format!("Key responsibilities relevant to {code_and_name}.")
        }
        PartRole::ProfessionalDevelopment => {
            format!("This professional development enhanced my ability to meet criteria for {code_and_name}.")
        }
    }
}

/// Lead-in built from an application-statement excerpt instead of the
/// code/name pair.
pub fn lead_in_from_application(role: PartRole, excerpt: &str) -> String {
    match role {
        PartRole::Qualification => {
            format!("Within this qualification, I was required to demonstrate competency in {excerpt}.")
        }
        PartRole::Experience => format!("Key responsibilities relevant to {excerpt}."),
        PartRole::ProfessionalDevelopment => {
            format!("This professional development enhanced my ability to meet criteria for {excerpt}.")
        }
    }
}

/// Shorten an application statement to its leading words for interpolation
/// into a lead-in sentence. Trailing periods are dropped so the template's
/// own full stop does not double up.
pub fn application_excerpt(statement: &str, max_words: usize) -> String {
    let words: Vec<&str> = statement.split_whitespace().take(max_words).collect();
    words.join(" ").trim_end_matches('.').to_string()
}

fn join_nonempty(code: &str, name: &str) -> String {
    if name.is_empty() {
        code.to_string()
    } else {
        format!("{code} {name}")
    }
}

/// Render the full narrative: lead-in, transition, bulleted criteria. An
/// empty bullet list still emits one bare bullet marker so the statement is
/// never empty text.
pub fn compose_statement(lead_in: &str, bullets: &[String]) -> String {
    let mut out = String::from(lead_in);
    out.push('\n');
    out.push_str(TRANSITION_PHRASE);
    if bullets.is_empty() {
        out.push('\n');
        out.push(BULLET_MARKER);
        return out;
    }
    for bullet in bullets {
        out.push('\n');
        out.push(BULLET_MARKER);
        out.push(' ');
        out.push_str(bullet);
    }
    out
}

/// Compose a statement for a unit's entry variant from matched bullets.
pub fn compose_for_unit(role: PartRole, unit: &UnitRecord, bullets: &[String]) -> String {
    compose_statement(&lead_in(role, &unit.code, &unit.name), bullets)
}
