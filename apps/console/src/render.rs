use client_core::{
    columns::{user_columns, TableRow},
    FetchOutcome, ViewState,
};
use shared::domain::{SortDirection, UserRecord};

const MAX_CELL: usize = 28;

/// Plain-text rendering of a users page, header marks the sorted column.
pub fn render_page(state: &ViewState<UserRecord>) -> String {
    let columns: Vec<_> = user_columns()
        .iter()
        .filter(|column| column.key != "actions")
        .collect();

    let rows: Vec<Vec<String>> = state
        .items
        .iter()
        .map(|user| {
            columns
                .iter()
                .map(|column| clip(&user.cell(column.key).unwrap_or_default()))
                .collect()
        })
        .collect();

    let headers: Vec<String> = columns
        .iter()
        .map(|column| {
            if column.key == state.sorting.field {
                let arrow = match state.sorting.direction {
                    SortDirection::Asc => '^',
                    SortDirection::Desc => 'v',
                };
                format!("{} {arrow}", column.label)
            } else {
                column.label.to_string()
            }
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, &headers, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    if rows.is_empty() {
        out.push_str("(no rows)\n");
    }

    let shown_page = state.current_page.saturating_sub(state.first_page()) + 1;
    out.push_str(&format!(
        "page {shown_page}/{} | {} rows | size {}",
        state.page_count().max(1),
        state.total_items,
        state.page_size
    ));
    if !state.search.is_empty() {
        out.push_str(&format!(" | search \"{}\"", state.search));
    }
    if state.is_loading {
        out.push_str(" | loading...");
    }
    out
}

/// Page text followed by the outcome message; None unless the fetch loaded.
pub fn render_outcome(state: &ViewState<UserRecord>, outcome: &FetchOutcome) -> Option<String> {
    if !outcome.is_success() {
        return None;
    }
    let mut out = render_page(state);
    if let Some(message) = outcome.message().filter(|message| !message.is_empty()) {
        out.push('\n');
        out.push_str(message);
    }
    Some(out)
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn clip(value: &str) -> String {
    if value.chars().count() <= MAX_CELL {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(MAX_CELL - 1).collect();
    clipped.push('~');
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{ControllerSettings, Seed};
    use shared::domain::{Sorting, UserId};

    #[test]
    fn marks_sorted_column_and_summarises_page() {
        let settings = ControllerSettings::default();
        let mut seed = Seed::new(
            vec![UserRecord {
                id: UserId(4),
                name: "Diego Silva".into(),
                document: "123".into(),
                email: "diego@example.com".into(),
                phone: "555".into(),
            }],
            11,
        );
        seed.sorting = Some(Sorting::new("name", SortDirection::Desc));
        let state = ViewState::seeded(&settings, seed);

        let text = render_page(&state);
        let header = text.lines().next().expect("header");
        assert!(header.contains("Name v"), "{header}");
        assert!(!header.contains("Actions"));
        assert!(text.contains("Diego Silva"));
        assert!(text.ends_with("page 1/2 | 11 rows | size 10"), "{text}");
    }

    #[test]
    fn loaded_outcome_appends_its_message() {
        let state = ViewState::seeded(&ControllerSettings::default(), Seed::new(Vec::new(), 0));
        let loaded = FetchOutcome::Loaded {
            total_items: 0,
            message: "Users loaded".into(),
        };

        let text = render_outcome(&state, &loaded).expect("rendered");
        assert!(text.contains("(no rows)"), "{text}");
        assert!(text.ends_with("\nUsers loaded"), "{text}");
        assert_eq!(render_outcome(&state, &FetchOutcome::Superseded), None);
    }

    #[test]
    fn long_cells_are_clipped() {
        let long = "x".repeat(40);
        assert_eq!(clip(&long).chars().count(), MAX_CELL);
        assert!(clip(&long).ends_with('~'));
    }
}
