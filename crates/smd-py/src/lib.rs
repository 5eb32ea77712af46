//! Python bindings for the smd HTML converter.

use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use smd_core::{
    to_html_with, Converter, Error as CoreError, ErrorKind as CoreErrorKind, Options,
    RenderStats,
};

fn to_py_err(e: CoreError) -> PyErr {
    match e.kind() {
        CoreErrorKind::LineTooLong => PyValueError::new_err(e.to_string()),
        CoreErrorKind::Io => PyIOError::new_err(e.to_string()),
    }
}

fn options(max_line_length: Option<usize>) -> Options {
    let mut options = Options::default();
    if let Some(limit) = max_line_length {
        options.max_line_len = limit;
    }
    options
}

fn collect_stats(text: &str, options: &Options) -> PyResult<RenderStats> {
    let (_, stats) = Converter::with_options(text.as_bytes(), std::io::sink(), options)
        .run()
        .map_err(to_py_err)?;
    Ok(stats)
}

fn stats_dict<'py>(py: Python<'py>, stats: &RenderStats) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("lines", stats.lines)?;
    dict.set_item("blocks", stats.blocks)?;
    dict.set_item("containers", stats.containers)?;
    dict.set_item("max_depth", stats.max_depth)?;
    Ok(dict)
}

// ============================================================================
// Renderer
// ============================================================================

/// Reusable converter settings.
///
/// Args:
///     max_line_length: Longest accepted input line in bytes (default: 4094)
#[pyclass(frozen, name = "Renderer")]
pub struct PyRenderer {
    options: Options,
}

#[pymethods]
impl PyRenderer {
    #[new]
    #[pyo3(signature = (max_line_length=None), text_signature = "(max_line_length=None)")]
    fn new(max_line_length: Option<usize>) -> Self {
        PyRenderer {
            options: options(max_line_length),
        }
    }

    #[getter]
    fn max_line_length(&self) -> usize {
        self.options.max_line_len
    }

    /// Convert a document to HTML. Raises ValueError on an overlong line.
    #[pyo3(text_signature = "(self, text)")]
    fn to_html(&self, py: Python<'_>, text: &str) -> PyResult<String> {
        py.allow_threads(|| to_html_with(text, &self.options))
            .map_err(to_py_err)
    }

    /// Convert a document and return conversion counters as a dict.
    #[pyo3(text_signature = "(self, text)")]
    fn stats<'py>(&self, py: Python<'py>, text: &str) -> PyResult<Bound<'py, PyDict>> {
        let stats = py.allow_threads(|| collect_stats(text, &self.options))?;
        stats_dict(py, &stats)
    }

    fn __repr__(&self) -> String {
        format!("Renderer(max_line_length={})", self.options.max_line_len)
    }
}

// ============================================================================
// Module functions
// ============================================================================

/// Convert a document to HTML.
///
/// Args:
///     text: Document string
///     max_line_length: Longest accepted input line in bytes (default: 4094)
///
/// Returns:
///     str: HTML fragment
///
/// Raises:
///     ValueError: When a line exceeds the length limit
#[pyfunction]
#[pyo3(signature = (text, max_line_length=None), text_signature = "(text, max_line_length=None)")]
fn to_html(py: Python<'_>, text: &str, max_line_length: Option<usize>) -> PyResult<String> {
    PyRenderer::new(max_line_length).to_html(py, text)
}

/// Convert a document and return its conversion counters.
///
/// Returns:
///     dict: ``lines``, ``blocks``, ``containers`` and ``max_depth``
#[pyfunction]
#[pyo3(signature = (text, max_line_length=None), text_signature = "(text, max_line_length=None)")]
fn stats<'py>(
    py: Python<'py>,
    text: &str,
    max_line_length: Option<usize>,
) -> PyResult<Bound<'py, PyDict>> {
    PyRenderer::new(max_line_length).stats(py, text)
}

// ============================================================================
// Module
// ============================================================================

/// smd - Streaming lightweight-markup to HTML converter.
#[pymodule]
fn pysmd(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyRenderer>()?;
    m.add_function(wrap_pyfunction!(to_html, m)?)?;
    m.add_function(wrap_pyfunction!(stats, m)?)?;
    m.add("DEFAULT_MAX_LINE_LENGTH", smd_core::DEFAULT_MAX_LINE_LEN)?;
    Ok(())
}
