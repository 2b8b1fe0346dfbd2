use csv::{QuoteStyle, WriterBuilder};

fn needs_formula_guard(value: &str) -> bool {
    matches!(value.chars().next(), Some('=' | '+' | '-' | '@'))
}

fn guard_cell(value: &str) -> String {
    if needs_formula_guard(value) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

/// Renders a header plus rows with every cell quoted and formula-like cells
/// prefixed so spreadsheets treat them as text.
pub fn render_csv(header: &[&str], rows: &[Vec<String>]) -> anyhow::Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(|cell| guard_cell(cell)))?;
    }
    finish(writer)
}

/// Renders blocks of rows of varying width, separated by a blank line.
pub fn render_sectioned_csv(sections: &[Vec<Vec<String>>]) -> anyhow::Result<String> {
    let mut rendered = Vec::with_capacity(sections.len());
    for section in sections {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .flexible(true)
            .from_writer(Vec::new());
        for row in section {
            writer.write_record(row.iter().map(|cell| guard_cell(cell)))?;
        }
        rendered.push(finish(writer)?);
    }
    Ok(rendered.join("\n"))
}

fn finish(writer: csv::Writer<Vec<u8>>) -> anyhow::Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}
