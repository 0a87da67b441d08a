use chrono::{DateTime, Utc};

use crate::domain::dashboard::{
    trailing_months, MonthWindow, MonthlyFigures, Overview, StatusFigures, DEFAULT_TREND_MONTHS,
};
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::domain::ports::DashboardRepository;

pub struct DashboardService<D> {
    repo: D,
}

impl<D: DashboardRepository> DashboardService<D> {
    pub fn new(repo: D) -> Self {
        Self { repo }
    }

    pub fn overview(&self) -> Result<Overview, DomainError> {
        self.repo.overview()
    }

    /// Count and amount for every status, in lifecycle order.
    pub fn by_status(&self) -> Result<Vec<(OrderStatus, StatusFigures)>, DomainError> {
        OrderStatus::ALL
            .into_iter()
            .map(|status| Ok((status, self.repo.status_figures(status)?)))
            .collect()
    }

    pub fn monthly_trends(
        &self,
        months: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Vec<(MonthWindow, MonthlyFigures)>, DomainError> {
        trailing_months(now, months.unwrap_or(DEFAULT_TREND_MONTHS))?
            .into_iter()
            .map(|window| {
                let figures = self.repo.monthly_figures(&window)?;
                Ok((window, figures))
            })
            .collect()
    }
}
