//! HTTP client facade: one GET wrapper per catalog operation
//!
//! Every wrapper delegates to [`HealthApi::execute`], which attaches the
//! credential, sends the request through a [`Transport`] and normalizes the
//! reply according to the operation's result shape.

use carecheck_core::{ApiSettings, Config, NormalizedResponse, Operation};
use serde_json::Value;

use crate::auth::{AuthError, AuthProvider, auth_from_config};

// ── Transport ──

/// A fully prepared GET request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Sends GET requests. Implemented over `reqwest` for real runs and by
/// in-memory fakes in tests.
pub trait Transport {
    /// # Errors
    ///
    /// Returns [`TransportError`] when no reply could be obtained.
    fn get(&self, request: &HttpRequest) -> Result<HttpReply, TransportError>;
}

/// Blocking `reqwest` transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Client with `reqwest`'s default settings, timeout included.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let mut req = self.client.get(&request.url);
        for (k, v) in &request.headers {
            req = req.header(k, v);
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(HttpReply { status, body })
    }
}

// ── Facade ──

/// Typed access to the healthcare API.
pub struct HealthApi<T = ReqwestTransport> {
    settings: ApiSettings,
    auth: Box<dyn AuthProvider>,
    transport: T,
}

impl HealthApi<ReqwestTransport> {
    /// Facade over a real HTTP client, configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if no credential is configured or the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, FacadeError> {
        let auth = auth_from_config(&config.auth)?;
        let transport = ReqwestTransport::new()?;
        Ok(Self::new(config.api_settings(), auth, transport))
    }
}

impl<T: Transport> HealthApi<T> {
    pub fn new(settings: ApiSettings, auth: Box<dyn AuthProvider>, transport: T) -> Self {
        Self {
            settings,
            auth,
            transport,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a GET for `operation` and normalize the reply.
    ///
    /// Relative endpoints are appended to the base URL; absolute
    /// `http(s)://` endpoints are used as given. Non-2xx replies are not
    /// errors; their status is carried in the response.
    ///
    /// # Errors
    ///
    /// Returns error if the credential is unavailable, the URL is invalid,
    /// or the transport fails. Nothing is retried.
    pub fn execute(
        &self,
        operation: Operation,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        let url = self.settings.resolve(endpoint);
        reqwest::Url::parse(&url).map_err(|e| FacadeError::InvalidUrl(format!("{url}: {e}")))?;

        let request = HttpRequest {
            headers: vec![
                ("Authorization".into(), self.auth.authorization()?),
                ("Content-Type".into(), "application/json".into()),
            ],
            url,
            body: body.cloned(),
        };

        tracing::debug!(operation = %operation, url = %request.url, "GET");
        let reply = self.transport.get(&request)?;
        tracing::debug!(operation = %operation, status = reply.status, "reply received");

        Ok(NormalizedResponse::from_body(
            reply.status,
            reply.body,
            operation.shape(),
        ))
    }

    pub fn get_all_departments(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetAllDepartments, endpoint, body)
    }

    pub fn get_all_items(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetAllItems, endpoint, body)
    }

    /// Doctor incentive summary; `Results.JsonData` holds the records.
    pub fn get_incentive_summary_report(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetIncentiveSummaryReport, endpoint, body)
    }

    /// Referral-only incentive summary; same shape as the doctor summary.
    pub fn get_inc_reff_summ_report(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetIncReffSummReport, endpoint, body)
    }

    pub fn get_hosp_inc_inc_report(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetHospIncIncReport, endpoint, body)
    }

    pub fn get_emp_bill_item(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetEmpBillItem, endpoint, body)
    }

    pub fn get_invntry_fiscal_yrs(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetInvntryFiscalYrs, endpoint, body)
    }

    pub fn get_act_inventory(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetActInventory, endpoint, body)
    }

    pub fn get_inv_sub_cat(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetInvSubCat, endpoint, body)
    }

    pub fn get_avl_qty_by_store_id(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetAvlQtyByStoreId, endpoint, body)
    }

    pub fn get_referrers_from_employee_settings(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetReferrersFromEmployeeSettings, endpoint, body)
    }

    pub fn get_lab_bill_cfg_items_by_department_name(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetLabBillCfgItemsByDepartmentName, endpoint, body)
    }

    pub fn get_patient_current_visit_context_by_patient_id_and_visit_id(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(
            Operation::GetPatientCurrentVisitContextByPatientIdAndVisitId,
            endpoint,
            body,
        )
    }

    pub fn get_patient_billing_context_by_patient_id(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetPatientBillingContextByPatientId, endpoint, body)
    }

    pub fn search_patient(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::SearchPatient, endpoint, body)
    }

    pub fn get_patient_notes(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetPatientNotes, endpoint, body)
    }

    pub fn get_admitted_patients_data(
        &self,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        self.execute(Operation::GetAdmittedPatientsData, endpoint, body)
    }

    /// Dispatch to the wrapper for `operation`.
    pub fn call(
        &self,
        operation: Operation,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<NormalizedResponse, FacadeError> {
        match operation {
            Operation::GetAllDepartments => self.get_all_departments(endpoint, body),
            Operation::GetAllItems => self.get_all_items(endpoint, body),
            Operation::GetIncentiveSummaryReport => {
                self.get_incentive_summary_report(endpoint, body)
            }
            Operation::GetIncReffSummReport => self.get_inc_reff_summ_report(endpoint, body),
            Operation::GetHospIncIncReport => self.get_hosp_inc_inc_report(endpoint, body),
            Operation::GetEmpBillItem => self.get_emp_bill_item(endpoint, body),
            Operation::GetInvntryFiscalYrs => self.get_invntry_fiscal_yrs(endpoint, body),
            Operation::GetActInventory => self.get_act_inventory(endpoint, body),
            Operation::GetInvSubCat => self.get_inv_sub_cat(endpoint, body),
            Operation::GetAvlQtyByStoreId => self.get_avl_qty_by_store_id(endpoint, body),
            Operation::GetReferrersFromEmployeeSettings => {
                self.get_referrers_from_employee_settings(endpoint, body)
            }
            Operation::GetLabBillCfgItemsByDepartmentName => {
                self.get_lab_bill_cfg_items_by_department_name(endpoint, body)
            }
            Operation::GetPatientCurrentVisitContextByPatientIdAndVisitId => {
                self.get_patient_current_visit_context_by_patient_id_and_visit_id(endpoint, body)
            }
            Operation::GetPatientBillingContextByPatientId => {
                self.get_patient_billing_context_by_patient_id(endpoint, body)
            }
            Operation::SearchPatient => self.search_patient(endpoint, body),
            Operation::GetPatientNotes => self.get_patient_notes(endpoint, body),
            Operation::GetAdmittedPatientsData => self.get_admitted_patients_data(endpoint, body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Cannot build HTTP client: {0}")]
    Client(String),
    #[error("HTTP error: {0}")]
    Request(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Invalid URL {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use std::cell::RefCell;

    /// Records requests and answers each with a canned reply.
    struct Canned {
        reply: HttpReply,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Self {
            Self {
                reply: HttpReply {
                    status,
                    body: body.to_string(),
                },
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn get(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn get(&self, _request: &HttpRequest) -> Result<HttpReply, TransportError> {
            Err(TransportError::Request("connection refused".into()))
        }
    }

    fn api<T: Transport>(transport: T) -> HealthApi<T> {
        HealthApi::new(
            ApiSettings::new("https://healthapp.yaksha.com/api/"),
            Box::new(StaticToken::new("Basic abc")),
            transport,
        )
    }

    #[test]
    fn relative_endpoint_joins_base_and_sets_headers() {
        let api = api(Canned::new(200, r#"{"Status":"OK","Results":[]}"#));
        let resp = api
            .get_all_departments("/AssetReports/GetAllDepartments", None)
            .unwrap();

        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.logical_status(), Some("OK"));
        let seen = api.transport.seen.borrow();
        assert_eq!(
            seen[0].url,
            "https://healthapp.yaksha.com/api/AssetReports/GetAllDepartments"
        );
        assert_eq!(seen[0].header("authorization"), Some("Basic abc"));
        assert_eq!(seen[0].header("Content-Type"), Some("application/json"));
        assert!(seen[0].body.is_none());
    }

    #[test]
    fn absolute_endpoint_passes_through() {
        let api = api(Canned::new(200, "{}"));
        let url = "https://healthapp.yaksha.com/Reporting/HospitalIncomeIncentiveReport?FromDate=2024-01-01";
        api.get_hosp_inc_inc_report(url, None).unwrap();
        assert_eq!(api.transport.seen.borrow()[0].url, url);
    }

    #[test]
    fn body_is_forwarded() {
        let api = api(Canned::new(200, "{}"));
        let body = serde_json::json!({"search": "Devid8"});
        api.search_patient("/Patient/SearchRegisteredPatient", Some(&body))
            .unwrap();
        assert_eq!(api.transport.seen.borrow()[0].body, Some(body));
    }

    #[test]
    fn error_status_is_a_response_not_an_error() {
        let api = api(Canned::new(500, "Internal Server Error"));
        let resp = api.get_all_items("/AssetReports/GetAllItems", None).unwrap();
        assert_eq!(resp.status_code(), 500);
        assert!(resp.payload().is_null());
    }

    #[test]
    fn record_shape_follows_operation() {
        let api = api(Canned::new(
            200,
            r#"{"Status":"OK","Results":{"PatientId":176}}"#,
        ));
        let resp = api
            .get_patient_billing_context_by_patient_id(
                "/Billing/PatientBillingContext?patientId=176",
                None,
            )
            .unwrap();
        assert!(resp.map_result().is_some());
    }

    #[test]
    fn transport_failure_is_fatal() {
        let api = api(Unreachable);
        let err = api.get_inv_sub_cat("/Inventory/SubCategories", None).unwrap_err();
        assert!(matches!(err, FacadeError::Transport(_)));
    }

    #[test]
    fn missing_credential_stops_before_sending() {
        let api = HealthApi::new(
            ApiSettings::new("https://healthapp.yaksha.com/api"),
            Box::new(StaticToken::new("")),
            Canned::new(200, "{}"),
        );
        let err = api.get_act_inventory("/ActivateInventory/", None).unwrap_err();
        assert!(matches!(err, FacadeError::Auth(AuthError::Empty)));
        assert!(api.transport.seen.borrow().is_empty());
    }

    #[test]
    fn invalid_url_is_reported() {
        let api = HealthApi::new(
            ApiSettings::new("not a url"),
            Box::new(StaticToken::new("Basic abc")),
            Canned::new(200, "{}"),
        );
        let err = api.get_all_items("/AssetReports/GetAllItems", None).unwrap_err();
        assert!(matches!(err, FacadeError::InvalidUrl(_)));
    }

    #[test]
    fn call_dispatches_every_operation() {
        let api = api(Canned::new(200, "{}"));
        for op in Operation::ALL {
            api.call(op, "/x", None).unwrap();
        }
        assert_eq!(api.transport.seen.borrow().len(), Operation::ALL.len());
    }

    #[test]
    fn reqwest_transport_builds_with_defaults() {
        assert!(ReqwestTransport::new().is_ok());
    }
}
