use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as read from the source
// ---------------------------------------------------------------------------

/// A dynamically-typed source cell, before it is normalised into an
/// [`AuctionRecord`] field. CSV, JSON and Parquet readers all produce these.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric coercion: numbers pass through, text is parsed, everything
    /// else (including unparseable text and NaN) becomes `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Bool(_) | CellValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// String coercion with surrounding whitespace removed. Nulls and cells
    /// that are empty after trimming become `None`.
    pub fn as_trimmed_text(&self) -> Option<String> {
        let s = match self {
            CellValue::Null => return None,
            CellValue::Float(v) if v.is_nan() => return None,
            CellValue::Text(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        (!s.is_empty()).then_some(s)
    }
}

// ---------------------------------------------------------------------------
// Column – the known attributes of a lot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Price,
    Artist,
    Material,
    Country,
    DominantColor,
    Brightness,
    Height,
    Width,
    Area,
    SoldYear,
    SoldTime,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Price,
        Column::Artist,
        Column::Material,
        Column::Country,
        Column::DominantColor,
        Column::Brightness,
        Column::Height,
        Column::Width,
        Column::Area,
        Column::SoldYear,
        Column::SoldTime,
    ];

    /// Column name as it appears in the source header.
    pub fn name(self) -> &'static str {
        match self {
            Column::Price => "price",
            Column::Artist => "artist",
            Column::Material => "material",
            Column::Country => "country",
            Column::DominantColor => "dominantcolor",
            Column::Brightness => "brightness",
            Column::Height => "height",
            Column::Width => "width",
            Column::Area => "area",
            Column::SoldYear => "sold_year",
            Column::SoldTime => "soldtime",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Schema – which columns the source actually carried
// ---------------------------------------------------------------------------

/// The set of columns present in a dataset or view. This is the single
/// capability query every aggregation and chart consults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: BTreeSet<Column>,
}

impl Schema {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Schema {
            columns: columns.into_iter().collect(),
        }
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// First column from `required` that is missing, if any.
    pub fn first_missing(&self, required: &[Column]) -> Option<Column> {
        required.iter().copied().find(|c| !self.has_column(*c))
    }

    pub fn insert(&mut self, column: Column) {
        self.columns.insert(column);
    }
}

// ---------------------------------------------------------------------------
// AuctionRecord – one lot
// ---------------------------------------------------------------------------

/// A single auction lot (one row of the source table). Every attribute is
/// optional; malformed source values were coerced to `None` at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuctionRecord {
    pub price: Option<f64>,
    pub artist: Option<String>,
    pub material: Option<String>,
    pub country: Option<String>,
    pub dominantcolor: Option<String>,
    pub brightness: Option<f64>,
    pub height: Option<f64>,
    pub width: Option<f64>,
    pub area: Option<f64>,
    /// May hold a non-positive sentinel meaning "year unknown".
    pub sold_year: Option<f64>,
}

impl AuctionRecord {
    /// Value of a numeric column, `None` for categorical columns.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::Price => self.price,
            Column::Brightness => self.brightness,
            Column::Height => self.height,
            Column::Width => self.width,
            Column::Area => self.area,
            Column::SoldYear => self.sold_year,
            _ => None,
        }
    }

    /// Value of a categorical column, `None` for numeric columns.
    pub fn category(&self, column: Column) -> Option<&str> {
        match column {
            Column::Artist => self.artist.as_deref(),
            Column::Material => self.material.as_deref(),
            Column::Country => self.country.as_deref(),
            Column::DominantColor => self.dominantcolor.as_deref(),
            _ => None,
        }
    }

    /// A year is known when it is present and strictly positive.
    pub fn valid_year(&self) -> Option<f64> {
        self.sold_year.filter(|y| *y > 0.0)
    }
}

// ---------------------------------------------------------------------------
// YearDomain – legal bounds of the year-range filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearDomain {
    pub min: i32,
    pub max: i32,
}

impl YearDomain {
    pub const FALLBACK: YearDomain = YearDomain {
        min: 1800,
        max: 2025,
    };

    /// Min/max over rows with a valid year, or `fallback` if there are none.
    pub fn compute(records: &[AuctionRecord], fallback: YearDomain) -> YearDomain {
        let (min, max) = records
            .iter()
            .filter_map(AuctionRecord::valid_year)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        if min > max {
            return fallback;
        }
        YearDomain {
            min: min.trunc() as i32,
            max: max.trunc() as i32,
        }
    }

    pub fn as_tuple(self) -> (i32, i32) {
        (self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// AuctionDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full, immutable dataset produced once by the loader.
#[derive(Debug, Clone)]
pub struct AuctionDataset {
    /// All lots, in source order.
    pub records: Vec<AuctionRecord>,
    /// Columns present in the source (plus `sold_year`, which is always set).
    pub schema: Schema,
    pub year_domain: YearDomain,
    /// Where the rows were read from.
    pub source: PathBuf,
}

impl AuctionDataset {
    pub fn new(
        records: Vec<AuctionRecord>,
        schema: Schema,
        source: PathBuf,
        fallback: YearDomain,
    ) -> Self {
        let year_domain = YearDomain::compute(&records, fallback);
        AuctionDataset {
            records,
            schema,
            year_domain,
            source,
        }
    }

    /// Number of lots.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
