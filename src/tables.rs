use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use irrigo::{
    core::{coordinator::SearchOutcome, schedule::DATE_FORMAT, table::ScheduleTable},
    quantity::area::SquareMetres,
    record::SimulationRecord,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

pub fn build_schedule_table(schedule: &ScheduleTable, field_size: SquareMetres) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Volume", "Depth"]);
    for row in schedule.rows() {
        table.add_row(vec![
            Cell::new(row.date.format(DATE_FORMAT)),
            Cell::new(row.volume).set_alignment(CellAlignment::Right),
            Cell::new(row.volume / field_size)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(schedule.total_volume())
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(schedule.total_volume() / field_size).set_alignment(CellAlignment::Right),
    ]);
    table
}

pub fn build_sweep_table(search: &SearchOutcome) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Budget", "Applied", "Yield", "Score", "Harvest", "Converged"]);
    for (index, scenario) in search.scenarios().iter().enumerate() {
        let is_winner = index == search.winner_index();
        let score = scenario.score();
        table.add_row(vec![
            Cell::new(scenario.budget)
                .set_alignment(CellAlignment::Right)
                .fg(if is_winner { Color::Green } else { Color::Reset }),
            Cell::new(scenario.evaluation.seasonal_irrigation).set_alignment(CellAlignment::Right),
            Cell::new(scenario.evaluation.crop_yield).set_alignment(CellAlignment::Right),
            Cell::new(format!("{score:.3}"))
                .set_alignment(CellAlignment::Right)
                .add_attribute(if score.is_finite() && score > 0.0 {
                    Attribute::NormalIntensity
                } else {
                    Attribute::Dim
                }),
            Cell::new(scenario.evaluation.harvest_date.format(DATE_FORMAT)),
            Cell::new(if scenario.converged { "yes" } else { "no" }).fg(if scenario.converged {
                Color::Reset
            } else {
                Color::DarkYellow
            }),
        ]);
    }
    table
}

pub fn build_record_table(record: &SimulationRecord) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("ID"), Cell::new(&record.id)]);
    table.add_row(vec![Cell::new("Owner"), Cell::new(record.owner.as_deref().unwrap_or("-"))]);
    table.add_row(vec![Cell::new("Crop"), Cell::new(&record.crop_type)]);
    table.add_row(vec![Cell::new("Stage"), Cell::new(record.crop_stage)]);
    table.add_row(vec![Cell::new("Start"), Cell::new(record.start_date.format(DATE_FORMAT))]);
    table.add_row(vec![Cell::new("End"), Cell::new(record.end_date.format(DATE_FORMAT))]);
    table.add_row(vec![Cell::new("Field size"), Cell::new(record.field_size)]);
    table.add_row(vec![Cell::new("Max water"), Cell::new(record.max_water)]);
    table.add_row(vec![
        Cell::new("Harvest").add_attribute(Attribute::Bold),
        Cell::new(record.harvest_date.format(DATE_FORMAT)).add_attribute(Attribute::Bold),
    ]);
    table
}
