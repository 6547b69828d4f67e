use super::filter::ActiveView;
use super::model::Column;

/// Ensure the view carries an `area` column.
///
/// * `area` already present → returned unchanged.
/// * `height` and `width` present → new view with `area = height * width`;
///   a missing operand leaves that row's area missing.
/// * otherwise → returned unchanged; callers check `has_column(Column::Area)`.
pub fn ensure_area(view: ActiveView) -> ActiveView {
    if view.has_column(Column::Area)
        || !(view.has_column(Column::Height) && view.has_column(Column::Width))
    {
        return view;
    }

    log::debug!("Deriving 'area' for {} lots", view.len());
    view.derive_column(Column::Area, |row| {
        row.area = match (row.height, row.width) {
            (Some(h), Some(w)) => Some(h * w),
            _ => None,
        };
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AuctionRecord, Schema};

    fn dims(h: Option<f64>, w: Option<f64>) -> AuctionRecord {
        AuctionRecord {
            price: Some(1.0),
            height: h,
            width: w,
            ..Default::default()
        }
    }

    fn view(rows: Vec<AuctionRecord>, columns: &[Column]) -> ActiveView {
        ActiveView::new(rows, Schema::new(columns.iter().copied())).unwrap()
    }

    #[test]
    fn area_is_height_times_width() {
        let v = view(
            vec![dims(Some(2.0), Some(3.5)), dims(None, Some(4.0)), dims(Some(1.0), None)],
            &[Column::Price, Column::Height, Column::Width],
        );
        let out = ensure_area(v);
        assert!(out.has_column(Column::Area));
        let areas: Vec<_> = out.rows().iter().map(|r| r.area).collect();
        assert_eq!(areas, vec![Some(7.0), None, None]);
    }

    #[test]
    fn existing_area_is_kept() {
        let mut row = dims(Some(2.0), Some(2.0));
        row.area = Some(99.0);
        let v = view(
            vec![row],
            &[Column::Price, Column::Height, Column::Width, Column::Area],
        );
        let out = ensure_area(v.clone());
        assert_eq!(out, v);
    }

    #[test]
    fn missing_dimension_leaves_view_alone() {
        let v = view(vec![dims(Some(2.0), None)], &[Column::Price, Column::Height]);
        let out = ensure_area(v.clone());
        assert!(!out.has_column(Column::Area));
        assert_eq!(out, v);
    }
}
