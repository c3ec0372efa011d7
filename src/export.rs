// =============================================================================
// EXPORT MODULE
// =============================================================================
// Spreadsheet export of the current grid view as an xlsx workbook.
//
// Sheet "Товары" holds one row per item; sheet "Информация" holds the report
// title, generation time and record count. Identifying fields (barcode,
// article, cell code) are written as text cells so spreadsheet programs keep
// leading zeros and never read them as numbers or formulas.
// =============================================================================

use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::format::{format_date_time, format_expiration_date};
use crate::models::Item;

pub const ITEMS_SHEET: &str = "Товары";
pub const INFO_SHEET: &str = "Информация";

pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const REPORT_TITLE: &str = "Отчет по товарам на складе";

/// Column headers with their widths in characters, in export order.
pub const COLUMNS: [(&str, f64); 16] = [
    ("Название", 50.0),
    ("Артикул", 15.0),
    ("Штрихкод", 20.0),
    ("Кол-во ЕХ", 12.0),
    ("Вложенность ЕХ", 15.0),
    ("Общее кол-во", 15.0),
    ("Ячейка", 15.0),
    ("Название ячейки", 25.0),
    ("ID склада", 12.0),
    ("ЕХ", 10.0),
    ("Состояние", 15.0),
    ("Причина", 20.0),
    ("СГ", 15.0),
    ("Создано", 20.0),
    ("Изменено", 20.0),
    ("Исполнитель", 20.0),
];

/// One worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }
}

/// Default download name: `inventory_report_YYYYMMDD.xlsx`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("inventory_report_{}.xlsx", date.format("%Y%m%d"))
}

fn row(item: &Item) -> [Cell; 16] {
    [
        Cell::text(item.name.as_str()),
        Cell::text(item.article.as_str()),
        Cell::text(item.shk.as_str()),
        Cell::Number(item.quantity as f64),
        Cell::Number(item.nested_quantity as f64),
        Cell::Number(item.product_qnt as f64),
        Cell::text(item.wr_shk.as_str()),
        Cell::text(item.wr_name.as_str()),
        item.id_sklad.map_or(Cell::Empty, |id| Cell::Number(id as f64)),
        Cell::text(item.prunit_name.as_str()),
        Cell::text(item.condition_state.as_str()),
        Cell::text(item.reason.as_str()),
        Cell::text(format_expiration_date(item.expiration_date.as_deref())),
        Cell::text(format_date_time(&item.create_date)),
        Cell::text(format_date_time(&item.update_date)),
        Cell::text(item.executor.as_str()),
    ]
}

/// Rows of the "Информация" sheet.
fn report_info(records: usize, generated_at: NaiveDateTime) -> [(&'static str, String); 3] {
    [
        ("Информация", REPORT_TITLE.to_string()),
        (
            "Дата формирования",
            generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
        ("Количество записей", records.to_string()),
    ]
}

/// Render `items` as an xlsx workbook.
pub fn export_xlsx(items: &[&Item], generated_at: NaiveDateTime) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(ITEMS_SHEET)?;
    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &bold)?;
        sheet.set_column_width(col, *width)?;
    }

    for (i, item) in items.iter().enumerate() {
        let line = i as u32 + 1;
        for (col, cell) in row(item).into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(line, col, text)?;
                }
                Cell::Number(number) => {
                    sheet.write_number(line, col, number)?;
                }
                Cell::Empty => {}
            }
        }
    }

    let info = workbook.add_worksheet();
    info.set_name(INFO_SHEET)?;
    info.set_column_width(0, 20.0)?;
    info.set_column_width(1, 40.0)?;
    for (line, (label, value)) in report_info(items.len(), generated_at).into_iter().enumerate() {
        info.write_string_with_format(line as u32, 0, label, &bold)?;
        info.write_string(line as u32, 1, value)?;
    }

    workbook.save_to_buffer()
}
