//! 仪表盘统计的纯计算部分

use std::collections::HashMap;

use crate::models::admin::responses::{GradeStats, LanguageStat, StatusStat};
use crate::models::submissions::entities::{Language, SubmissionFacet, SubmissionStatus};

/// 按语言分组计数，数量降序，同数量按语言名排序；没有提交的语言不出现
pub fn language_stats(facets: &[SubmissionFacet]) -> Vec<LanguageStat> {
    let mut counts: HashMap<Language, i64> = HashMap::new();
    for facet in facets {
        *counts.entry(facet.language).or_default() += 1;
    }

    let mut stats: Vec<LanguageStat> = counts
        .into_iter()
        .map(|(language, count)| LanguageStat { language, count })
        .collect();
    stats.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.language.as_str().cmp(b.language.as_str()))
    });
    stats
}

/// 按状态计数，按生命周期顺序列出全部状态
pub fn status_stats(facets: &[SubmissionFacet]) -> Vec<StatusStat> {
    SubmissionStatus::all()
        .iter()
        .map(|status| StatusStat {
            status: *status,
            count: facets.iter().filter(|f| f.status == *status).count() as i64,
        })
        .collect()
}

/// 已评分提交的平均分、最低分与最高分，平均分保留两位小数
pub fn grade_stats(facets: &[SubmissionFacet]) -> GradeStats {
    let grades: Vec<f64> = facets.iter().filter_map(|f| f.grade).collect();
    if grades.is_empty() {
        return GradeStats {
            average: 0.0,
            min: 0.0,
            max: 0.0,
            graded_count: 0,
        };
    }

    let sum: f64 = grades.iter().sum();
    let average = sum / grades.len() as f64;
    GradeStats {
        average: (average * 100.0).round() / 100.0,
        min: grades.iter().copied().fold(f64::INFINITY, f64::min),
        max: grades.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        graded_count: grades.len() as i64,
    }
}

/// UTC 当天零点
pub fn start_of_day(now: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    now.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}
