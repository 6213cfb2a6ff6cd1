use std::path::{Path, PathBuf};

use penney_core::model::pattern::Pattern;
use penney_core::score::tally::{ResultsTable, WinRecord};
use plotters::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("no decks scored yet, nothing to plot")]
    Empty,
    #[error("failed to render heatmap: {0}")]
    Render(String),
}

/// Render one 8×8 win-rate heatmap per metric (tricks and cards) into
/// `dir`. Cell (row, column) is my-choice row's win rate against the
/// opponent's column choice; the diagonal has no matchup and stays
/// blank.
pub fn render_heatmaps(table: &ResultsTable, dir: &Path) -> Result<Vec<PathBuf>, HeatmapError> {
    if table.decks_scored() == 0 {
        return Err(HeatmapError::Empty);
    }

    let tricks = win_rate_grid(table, |record| record.wins_mine_tricks);
    let cards = win_rate_grid(table, |record| record.wins_mine_cards);

    let tricks_path = render_grid(&tricks, "Win rate by tricks", &dir.join("heatmap_tricks.png"))?;
    let cards_path = render_grid(&cards, "Win rate by cards", &dir.join("heatmap_cards.png"))?;
    Ok(vec![tricks_path, cards_path])
}

fn win_rate_grid(
    table: &ResultsTable,
    wins: fn(&WinRecord) -> u64,
) -> [[Option<f64>; Pattern::COUNT]; Pattern::COUNT] {
    let mut grid = [[None; Pattern::COUNT]; Pattern::COUNT];
    let total = table.decks_scored() as f64;
    for (pair, record) in table.combos().pairs().iter().zip(table.records()) {
        let row = pair.mine().index();
        let column = pair.theirs().index();
        grid[row][column] = Some(wins(record) as f64 / total);
    }
    grid
}

fn render_grid(
    grid: &[[Option<f64>; Pattern::COUNT]; Pattern::COUNT],
    title: &str,
    path: &Path,
) -> Result<PathBuf, HeatmapError> {
    let output_path = path.to_path_buf();
    let grid = *grid;
    let title = title.to_string();

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));

    let plot_attempt = std::panic::catch_unwind(move || {
        let root = BitMapBackend::new(&output_path, (720, 640)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| HeatmapError::Render(e.to_string()))?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .caption(&title, ("sans-serif", 22))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 60)
            .build_cartesian_2d(0..Pattern::COUNT, 0..Pattern::COUNT)
            .map_err(|e| HeatmapError::Render(e.to_string()))?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("opponent pattern")
            .y_desc("my pattern")
            .x_label_formatter(&pattern_label)
            .y_label_formatter(&pattern_label)
            .draw()
            .map_err(|e| HeatmapError::Render(e.to_string()))?;

        chart
            .draw_series((0..Pattern::COUNT).flat_map(|row| {
                (0..Pattern::COUNT).map(move |column| {
                    let style = match grid[row][column] {
                        Some(rate) => rate_color(rate).filled(),
                        None => WHITE.filled(),
                    };
                    Rectangle::new([(column, row), (column + 1, row + 1)], style)
                })
            }))
            .map_err(|e| HeatmapError::Render(e.to_string()))?;

        drop(chart);

        root.present()
            .map_err(|e| HeatmapError::Render(e.to_string()))?;

        drop(root);

        Ok(output_path)
    });

    std::panic::set_hook(prev_hook);

    match plot_attempt {
        Ok(result) => result,
        Err(_) => Err(HeatmapError::Render(
            "plotters panicked while rendering (missing font support?)".into(),
        )),
    }
}

fn pattern_label(index: &usize) -> String {
    Pattern::from_index(*index)
        .map(|pattern| pattern.to_string())
        .unwrap_or_default()
}

/// Low win rates shade blue, high win rates shade red.
fn rate_color(rate: f64) -> RGBColor {
    let clamped = rate.clamp(0.0, 1.0);
    let hot = (clamped * 255.0).round() as u8;
    RGBColor(hot, 64, 255 - hot)
}

#[cfg(test)]
mod tests {
    use super::{HeatmapError, render_heatmaps, win_rate_grid};
    use penney_core::model::deck::Deck;
    use penney_core::model::pair::ComboSet;
    use penney_core::score::tally::ResultsTable;
    use tempfile::tempdir;

    #[test]
    fn empty_table_has_nothing_to_plot() {
        let dir = tempdir().unwrap();
        let table = ResultsTable::blank(ComboSet::standard());
        let err = render_heatmaps(&table, dir.path()).unwrap_err();
        assert!(matches!(err, HeatmapError::Empty));
    }

    #[test]
    fn grid_covers_everything_but_the_diagonal() {
        let mut table = ResultsTable::blank(ComboSet::standard());
        for seed in 0..4 {
            table.absorb_deck(&Deck::shuffled_with_seed(seed));
        }

        let grid = win_rate_grid(&table, |record| record.wins_mine_tricks);
        for (row, cells) in grid.iter().enumerate() {
            for (column, cell) in cells.iter().enumerate() {
                if row == column {
                    assert!(cell.is_none());
                } else {
                    let rate = cell.expect("off-diagonal cell populated");
                    assert!((0.0..=1.0).contains(&rate));
                }
            }
        }
    }
}
