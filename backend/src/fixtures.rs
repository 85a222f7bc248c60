//! In-memory workbooks shared by the unit tests.

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWorkbook, XlsxError};

/// Three sheets:
///
/// - `Clientes`: Nombre / Apellido / Edad / Alta, two rows, second row has no Apellido
/// - `Proveedores`: Nombre / Ciudad, one row with non-ASCII text
/// - `Vacía`: header row only
pub fn people_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = XlsxWorkbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let clientes = workbook.add_worksheet().set_name("Clientes")?;
    clientes.write_string(0, 0, "Nombre")?;
    clientes.write_string(0, 1, "Apellido")?;
    clientes.write_string(0, 2, "Edad")?;
    clientes.write_string(0, 3, "Alta")?;
    clientes.write_string(1, 0, "Ana")?;
    clientes.write_string(1, 1, "Ruiz")?;
    clientes.write_number(1, 2, 34.0)?;
    clientes.write_datetime_with_format(1, 3, &ExcelDateTime::from_ymd(2024, 1, 15)?, &date_format)?;
    clientes.write_string(2, 0, "José")?;
    clientes.write_number(2, 2, 28.5)?;

    let proveedores = workbook.add_worksheet().set_name("Proveedores")?;
    proveedores.write_string(0, 0, "Nombre")?;
    proveedores.write_string(0, 1, "Ciudad")?;
    proveedores.write_string(1, 0, "Müller & Söhne")?;
    proveedores.write_string(1, 1, "São Paulo")?;

    let vacia = workbook.add_worksheet().set_name("Vacía")?;
    vacia.write_string(0, 0, "Nombre")?;
    vacia.write_string(0, 1, "Apellido")?;

    workbook.save_to_buffer()
}

/// One sheet whose header row has a blank cell, a duplicate name and a
/// numeric header, followed by a fully blank row between two data rows.
pub fn irregular_headers_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = XlsxWorkbook::new();

    let sheet = workbook.add_worksheet().set_name("Datos")?;
    sheet.write_string(0, 0, "Código")?;
    // (0, 1) left blank
    sheet.write_string(0, 2, "Código")?;
    sheet.write_number(0, 3, 2024.0)?;
    sheet.write_string(1, 0, "A-1")?;
    sheet.write_string(1, 1, "x")?;
    sheet.write_string(1, 2, "B-1")?;
    sheet.write_number(1, 3, 10.0)?;
    sheet.write_string(3, 0, "A-2")?;
    sheet.write_boolean(3, 1, true)?;

    workbook.save_to_buffer()
}

/// Two sheets with awkward header rows:
///
/// - `Relleno`: headers padded with whitespace
/// - `Desplazada`: data starts at B1, column A is never written
pub fn offset_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = XlsxWorkbook::new();

    let padded = workbook.add_worksheet().set_name("Relleno")?;
    padded.write_string(0, 0, "  Nombre ")?;
    padded.write_string(0, 1, " Apellido")?;
    padded.write_string(1, 0, "Ana")?;
    padded.write_string(1, 1, "Ruiz")?;

    let offset = workbook.add_worksheet().set_name("Desplazada")?;
    offset.write_string(0, 1, "Nombre")?;
    offset.write_string(0, 2, "Apellido")?;
    offset.write_string(1, 1, "Ana")?;
    offset.write_string(1, 2, "Ruiz")?;

    workbook.save_to_buffer()
}
