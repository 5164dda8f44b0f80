use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"a = ([\d.]+) A\nb = ([\d.]+) A\nc = ([\d.]+) A\nal = ([\d.]+) deg\nbe = ([\d.]+) deg\nga = ([\d.]+) deg",
    )
    .unwrap()
});

static CHUNK_CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Cell parameters ([\d.]+) ([\d.]+) ([\d.]+) nm, ([\d.]+) ([\d.]+) ([\d.]+) deg")
        .unwrap()
});

/// Unit-cell parameters: axis lengths in angstroms, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        UnitCell { a, b, c, alpha, beta, gamma }
    }

    /// Reference cell from a stream-file header, where lengths are already in
    /// angstroms.
    pub fn from_header(header: &str) -> Option<Self> {
        let six = capture_six(&HEADER_CELL_RE, header)?;
        Some(UnitCell::new(six[0], six[1], six[2], six[3], six[4], six[5]))
    }

    /// Fitted cell from a chunk's `Cell parameters` line. The stream format
    /// reports lengths in nanometers; they are converted to angstroms here.
    pub fn from_chunk(chunk: &str) -> Option<Self> {
        let six = capture_six(&CHUNK_CELL_RE, chunk)?;
        Some(UnitCell::new(six[0] * 10.0, six[1] * 10.0, six[2] * 10.0, six[3], six[4], six[5]))
    }

    pub fn lengths(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    pub fn angles(&self) -> [f64; 3] {
        [self.alpha, self.beta, self.gamma]
    }
}

fn capture_six(re: &Regex, text: &str) -> Option<[f64; 6]> {
    let caps = re.captures(text)?;
    let mut out = [0.0; 6];
    for (slot, cap) in out.iter_mut().zip(caps.iter().skip(1)) {
        *slot = cap?.as_str().parse().ok()?;
    }
    Some(out)
}

/// Mean absolute deviation of the measured cell from the reference cell,
/// returned as (length deviation in angstroms, angle deviation in degrees).
pub fn cell_deviation(measured: &UnitCell, reference: &UnitCell) -> (f64, f64) {
    let length_deviation = mean_abs_diff(&measured.lengths(), &reference.lengths());
    let angle_deviation = mean_abs_diff(&measured.angles(), &reference.angles());
    (length_deviation, angle_deviation)
}

fn mean_abs_diff(measured: &[f64; 3], reference: &[f64; 3]) -> f64 {
    measured
        .iter()
        .zip(reference)
        .map(|(m, r)| (m - r).abs())
        .sum::<f64>()
        / 3.0
}
