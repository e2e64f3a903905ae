//! The regression suite: facade call, inspection, validation, assertions
//!
//! Cases run sequentially in table order. A case that cannot obtain its
//! parameters, credential or reply is `Errored`; a case whose reply breaks an
//! assertion is `Failed`. Neither stops the remaining cases unless
//! `stop_on_failure` is set.

mod cases;

use std::path::PathBuf;

use carecheck_core::{
    CaseOutcome, CaseStatus, Config, Expectations, Inspector, NormalizedResponse, Operation,
    OperationResult, PlannedCase, RunPlan, SuiteReport, Validator, VerdictPolicy,
    validate_config,
};
use serde_json::Value;

use crate::facade::{HealthApi, Transport};

pub use cases::{CASES, Case, CaseContext, Steps, required_params};

/// Runs the case table against a facade.
pub struct Suite {
    config: Config,
    validator: Validator,
    inspector: Option<(Inspector, PathBuf)>,
    only: Vec<String>,
    stop_on_failure: bool,
}

impl Suite {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let inspector = config
            .inspect
            .as_ref()
            .map(|i| (Inspector::new(i.tokens.iter().cloned()), i.artifact.clone()));
        Self {
            config: config.clone(),
            validator: Validator::builtin(),
            inspector,
            only: Vec::new(),
            stop_on_failure: false,
        }
    }

    /// Restrict the run to the named cases; empty means all.
    #[must_use]
    pub fn with_only(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    #[must_use]
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Case names in `only` that are not in the table.
    #[must_use]
    pub fn unknown_cases(&self) -> Vec<&str> {
        self.only
            .iter()
            .map(String::as_str)
            .filter(|name| !CASES.iter().any(|c| c.name == *name))
            .collect()
    }

    fn selected(&self) -> impl Iterator<Item = &'static Case> + '_ {
        CASES
            .iter()
            .filter(|c| self.only.is_empty() || self.only.iter().any(|n| n == c.name))
    }

    fn context(&self) -> CaseContext<'_> {
        CaseContext {
            params: &self.config.params,
            site_url: &self.config.site_url,
            expect: &self.config.expect,
        }
    }

    /// What a run would do. No request is sent.
    #[must_use]
    pub fn plan(&self) -> RunPlan {
        let ctx = self.context();
        let settings = self.config.api_settings();
        let cases = self
            .selected()
            .map(|case| PlannedCase {
                case: case.name.to_string(),
                operations: case
                    .operations()
                    .iter()
                    .map(|op| op.name().to_string())
                    .collect(),
                url: case.first_endpoint(&ctx).ok().map(|e| settings.resolve(&e)),
                missing_params: case
                    .params
                    .iter()
                    .filter(|p| !self.config.params.contains(p))
                    .map(|p| (*p).to_string())
                    .collect(),
            })
            .collect();

        RunPlan {
            cases,
            validations: validate_config(&self.config, &required_params()),
        }
    }

    /// Run the selected cases and judge them.
    pub fn run<T: Transport>(&self, api: &HealthApi<T>) -> SuiteReport {
        let mut outcomes = Vec::new();

        for case in self.selected() {
            tracing::info!(case = case.name, "running case");
            let outcome = self.run_case(api, case);
            match outcome.status {
                CaseStatus::Passed => tracing::info!(case = case.name, "passed"),
                status => tracing::warn!(case = case.name, %status, "case did not pass"),
            }

            let stop = self.stop_on_failure && !outcome.passed();
            outcomes.push(outcome);
            if stop {
                tracing::warn!("stopping after first unsuccessful case");
                break;
            }
        }

        SuiteReport {
            verdict: VerdictPolicy.verdict(&outcomes),
            cases: outcomes,
        }
    }

    fn run_case<T: Transport>(&self, api: &HealthApi<T>, case: &Case) -> CaseOutcome {
        let mut outcome = CaseOutcome::new(case.name);
        let ctx = self.context();

        match &case.steps {
            Steps::Single {
                operation,
                endpoint,
                expect,
            } => match endpoint(&ctx) {
                Ok(endpoint) => {
                    self.step(api, *operation, &endpoint, &expect(&ctx), &mut outcome);
                }
                Err(e) => outcome.error(e.to_string()),
            },
            Steps::PatientNotes => self.patient_notes(api, &ctx, &mut outcome),
        }

        outcome
    }

    /// Search the configured patient name, then check that patient's notes.
    fn patient_notes<T: Transport>(
        &self,
        api: &HealthApi<T>,
        ctx: &CaseContext<'_>,
        outcome: &mut CaseOutcome,
    ) {
        let search = match cases::patient_search_endpoint(ctx) {
            Ok(endpoint) => endpoint,
            Err(e) => return outcome.error(e.to_string()),
        };
        let Some(found) = self.step(
            api,
            Operation::SearchPatient,
            &search,
            &Expectations::new(),
            outcome,
        ) else {
            return;
        };

        let patient_id = found
            .list_result()
            .and_then(<[Value]>::first)
            .and_then(|record| record.get("PatientId"))
            .and_then(Value::as_i64);
        let Some(patient_id) = patient_id else {
            return outcome.fail("searchPatient: no PatientId in the first result");
        };
        tracing::info!(patient_id, "patient found");

        self.step(
            api,
            Operation::GetPatientNotes,
            &cases::patient_notes_endpoint(patient_id),
            &Expectations::new().with("PatientId", patient_id),
            outcome,
        );
    }

    /// One call: send, inspect the wrapper, validate, assert HTTP 200.
    ///
    /// Returns the response unless the call itself failed.
    fn step<T: Transport>(
        &self,
        api: &HealthApi<T>,
        operation: Operation,
        endpoint: &str,
        expectations: &Expectations,
        outcome: &mut CaseOutcome,
    ) -> Option<NormalizedResponse> {
        let response = match api.call(operation, endpoint, None) {
            Ok(response) => response,
            Err(e) => {
                outcome.error(format!("{operation}: {e}"));
                return None;
            }
        };
        tracing::debug!(operation = %operation, "response:\n{}", response.pretty());

        let inspection = self
            .inspector
            .as_ref()
            .map(|(inspector, path)| inspector.inspect_file(path, operation.method_name()));
        if let Some(inspection) = inspection.as_ref().filter(|i| !i.passed()) {
            outcome.fail(format!("{}: {inspection}", operation.method_name()));
        }

        let validation = self
            .validator
            .validate(operation.name(), &response, expectations);
        for diagnostic in &validation.diagnostics {
            outcome.fail(format!("{operation}: {diagnostic}"));
        }

        if response.status_code() != 200 {
            outcome.fail(format!(
                "{operation}: status code {}, expected 200",
                response.status_code()
            ));
        }

        outcome.operations.push(OperationResult {
            operation: operation.name().to_string(),
            http_status: response.status_code(),
            inspection,
            validation: Some(validation),
        });
        Some(response)
    }
}
