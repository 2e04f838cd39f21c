//! Terminal rendering of the domain state

use std::fmt::Write;

use colored::Colorize;

use crate::domain::{DomainState, Project, ProjectStatus};

/// Characters of an ID shown in listings; enough to pass back as a prefix
const SHORT_ID: usize = 8;

fn short(id: &str) -> &str {
    id.get(..SHORT_ID).unwrap_or(id)
}

fn status_colored(status: ProjectStatus) -> colored::ColoredString {
    match status {
        ProjectStatus::OnTrack => status.as_str().green(),
        ProjectStatus::AtRisk => status.as_str().yellow(),
        ProjectStatus::Delayed => status.as_str().red(),
        ProjectStatus::Completed => status.as_str().cyan(),
        ProjectStatus::Maintenance => status.as_str().dimmed(),
    }
}

/// Human-readable listing of everything in the state
pub fn state_text(state: &DomainState) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Projects".bright_cyan().bold());
    if state.projects.is_empty() {
        let _ = writeln!(out, "  {}", "(none)".dimmed());
    }
    for p in &state.projects {
        let _ = writeln!(
            out,
            "  {} {} [{}] {}",
            short(&p.id).dimmed(),
            p.name,
            p.role,
            status_colored(p.status)
        );
        if !p.next_step.is_empty() {
            let _ = writeln!(out, "      next: {}", p.next_step);
        }
        if let Some(update) = p.latest_update() {
            let _ = writeln!(
                out,
                "      {} {}",
                update.timestamp.format("%Y-%m-%d").to_string().dimmed(),
                update.content
            );
        }
    }

    let _ = writeln!(out, "{}", "Tasks".bright_cyan().bold());
    if state.tasks.is_empty() {
        let _ = writeln!(out, "  {}", "(none)".dimmed());
    }
    for t in &state.tasks {
        let mark = if t.completed { "✓".green() } else { "·".normal() };
        let project = t
            .project_id
            .as_deref()
            .and_then(|id| state.find::<Project>(id))
            .map(|p| format!(" ({})", p.name))
            .unwrap_or_default();
        let _ = writeln!(out, "  {} {} {}{} [{}]", short(&t.id).dimmed(), mark, t.text, project, t.role);
    }

    let _ = writeln!(out, "{}", "Habits".bright_cyan().bold());
    if state.habits.is_empty() {
        let _ = writeln!(out, "  {}", "(none)".dimmed());
    }
    for h in &state.habits {
        let mark = if h.completed_today { "✓".green() } else { "·".normal() };
        let _ = writeln!(
            out,
            "  {} {} {} ({}) streak {}",
            short(&h.id).dimmed(),
            mark,
            h.name,
            h.category,
            h.streak
        );
    }

    let _ = writeln!(out, "{}", "Facts".bright_cyan().bold());
    out.push_str(&facts_text(state));
    out
}

pub fn facts_text(state: &DomainState) -> String {
    if state.facts.is_empty() {
        return format!("  {}\n", "(none)".dimmed());
    }
    state.facts.iter().map(|f| format!("  - {}\n", f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Habit, Role, Task};
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn test_state_text_lists_entities_with_short_ids() {
        colored::control::set_override(false);
        let now = Utc::now();
        let project = Project::new("No Excuse Campaign", Role::Founder, ProjectStatus::AtRisk, now);
        let task = Task::new("Draft script", Role::Founder, Some(project.id.clone()), now);
        let habit = Habit::new("Record daily video", "content", now);
        let state = DomainState {
            projects: vec![Arc::new(project.clone())],
            tasks: vec![Arc::new(task.clone())],
            habits: vec![Arc::new(habit.clone())],
            facts: Arc::new(vec!["Prefers mornings".to_string()]),
        };

        let text = state_text(&state);

        assert!(text.contains(&format!("{} No Excuse Campaign [Founder] at_risk", &project.id[..8])));
        assert!(text.contains("Draft script (No Excuse Campaign) [Founder]"));
        assert!(text.contains("Record daily video (content) streak 0"));
        assert!(text.contains("  - Prefers mornings"));
    }

    #[test]
    fn test_empty_state_says_none() {
        colored::control::set_override(false);
        let text = state_text(&DomainState::default());
        assert_eq!(text.matches("(none)").count(), 4);
    }
}
