use crate::error::{GreenOpsError, Result};
use crate::models::CropStage;

/// The stage a crop is in on a given day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthStage<'a> {
    pub stage: &'a CropStage,
    pub name: &'a str,
    pub days_in_stage: i64,
}

/// Walk the stages in order, accumulating durations, and return the one
/// whose cumulative range contains `days_since_planting`.
///
/// Past the end of the season the last stage is returned and `days_in_stage`
/// is the raw `days_since_planting`, not clamped to that stage's duration.
pub fn resolve_growth_stage(stages: &[CropStage], days_since_planting: i64) -> Result<GrowthStage<'_>> {
    let last = stages.last().ok_or(GreenOpsError::EmptyStages)?;

    if days_since_planting < 0 {
        return Err(GreenOpsError::InvalidData(format!(
            "days since planting is negative ({})",
            days_since_planting
        )));
    }

    let mut accumulated: i64 = 0;
    for stage in stages {
        let stage_end = accumulated + i64::from(stage.duration);
        if days_since_planting < stage_end {
            return Ok(GrowthStage {
                stage,
                name: &stage.name,
                days_in_stage: days_since_planting - accumulated,
            });
        }
        accumulated = stage_end;
    }

    Ok(GrowthStage {
        stage: last,
        name: &last.name,
        days_in_stage: days_since_planting,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crop::fixtures::maize;

    #[test]
    fn maize_known_days() {
        let crop = maize();

        let stage = resolve_growth_stage(&crop.stages, 5).unwrap();
        assert_eq!(stage.name, "Initial");
        assert_eq!(stage.days_in_stage, 5);

        let stage = resolve_growth_stage(&crop.stages, 20).unwrap();
        assert_eq!(stage.name, "Development");
        assert_eq!(stage.days_in_stage, 6); // 20 - 14

        let stage = resolve_growth_stage(&crop.stages, 47).unwrap();
        assert_eq!(stage.name, "Mid");
        assert_eq!(stage.days_in_stage, 13); // 47 - 14 - 20

        let stage = resolve_growth_stage(&crop.stages, 80).unwrap();
        assert_eq!(stage.name, "Late");
    }

    #[test]
    fn stage_boundaries() {
        let crop = maize();

        assert_eq!(resolve_growth_stage(&crop.stages, 0).unwrap().name, "Initial");
        assert_eq!(resolve_growth_stage(&crop.stages, 13).unwrap().name, "Initial");

        let first_dev = resolve_growth_stage(&crop.stages, 14).unwrap();
        assert_eq!(first_dev.name, "Development");
        assert_eq!(first_dev.days_in_stage, 0);

        let last_day = resolve_growth_stage(&crop.stages, 78).unwrap();
        assert_eq!(last_day.name, "Late");
        assert_eq!(last_day.days_in_stage, 19);
    }

    #[test]
    fn every_day_in_season_maps_to_its_stage() {
        let crop = maize();
        let mut accumulated = 0i64;
        for stage in &crop.stages {
            for offset in 0..i64::from(stage.duration) {
                let day = accumulated + offset;
                let resolved = resolve_growth_stage(&crop.stages, day).unwrap();
                assert_eq!(resolved.name, stage.name, "day {}", day);
                assert_eq!(resolved.days_in_stage, offset, "day {}", day);
            }
            accumulated += i64::from(stage.duration);
        }
    }

    #[test]
    fn overflow_keeps_last_stage_unclamped() {
        let crop = maize();
        let season = i64::from(crop.season_length());

        for day in [season, season + 1, 365] {
            let resolved = resolve_growth_stage(&crop.stages, day).unwrap();
            assert_eq!(resolved.name, "Late");
            assert_eq!(resolved.days_in_stage, day);
        }
    }

    #[test]
    fn empty_stages_fail() {
        let err = resolve_growth_stage(&[], 5).unwrap_err();
        assert!(matches!(err, GreenOpsError::EmptyStages));
    }

    #[test]
    fn negative_days_fail() {
        let crop = maize();
        let err = resolve_growth_stage(&crop.stages, -1).unwrap_err();
        assert!(matches!(err, GreenOpsError::InvalidData(_)));
    }

    #[test]
    fn zero_duration_stage_is_skipped() {
        let mut crop = maize();
        crop.stages[0].duration = 0;

        let resolved = resolve_growth_stage(&crop.stages, 0).unwrap();
        assert_eq!(resolved.name, "Development");
        assert_eq!(resolved.days_in_stage, 0);
    }
}
