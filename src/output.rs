//! Synthesis summary table.

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::terraform::{Address, Stack, SynthReport};

/// Row for the declared block table.
#[derive(Tabled)]
struct BlockRow {
    #[tabled(rename = "WAVE")]
    wave: usize,
    #[tabled(rename = "ADDRESS")]
    address: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "PROVIDER")]
    provider: String,
    #[tabled(rename = "DEPENDS ON")]
    depends_on: usize,
}

fn colorize_kind(address: &Address) -> String {
    let kind = address.category();
    match address {
        Address::Module { .. } => kind.cyan().to_string(),
        Address::Data { .. } => kind.dimmed().to_string(),
        Address::Resource { .. } => kind.green().to_string(),
    }
}

fn build_rows(stack: &Stack, report: &SynthReport) -> Vec<BlockRow> {
    report
        .waves
        .iter()
        .enumerate()
        .flat_map(|(index, wave)| wave.iter().map(move |address| (index + 1, address)))
        .filter_map(|(wave, address)| {
            let block = stack.get(address)?;
            Some(BlockRow {
                wave,
                address: address.to_string(),
                kind: colorize_kind(address),
                provider: block
                    .provider_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "-".to_string()),
                depends_on: stack.edges(block).len(),
            })
        })
        .collect()
}

/// Print the blocks of a synthesized stack, grouped by dependency wave.
pub fn print_summary(stack: &Stack, report: &SynthReport) {
    let rows = build_rows(stack, report);
    if rows.is_empty() {
        println!("No blocks declared.");
        return;
    }

    println!(
        "{} ({} blocks, {} waves):",
        format!("Stack/{}", stack.name()).bold(),
        report.block_count,
        report.waves.len()
    );

    let mut table = Table::new(&rows);
    apply_table_style(&mut table);
    println!("{}", table);
    println!();
    println!("Wrote {}", report.config_path.display().to_string().green());
}

fn apply_table_style(table: &mut Table) {
    use tabled::settings::object::Columns;
    use tabled::settings::themes::Theme;
    use tabled::settings::{Modify, Padding};

    let mut theme = Theme::from_style(Style::empty());
    theme.remove_horizontal_lines();
    table.with(theme);
    table.with(Modify::new(Columns::new(..)).with(Padding::new(0, 2, 0, 0)));
}
