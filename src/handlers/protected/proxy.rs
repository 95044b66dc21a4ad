// handlers/protected/proxy.rs - declarative table of proxied upstream operations
//
// Each entry is served by the same pipeline: session gate, body validation,
// forward, normalize. Only the entry decides envelope, required fields and
// compatibility shims.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::HeaderMap,
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::Envelope::{Message, Problem};
use crate::gateway::{GatewayRequest, Reshape, RouteSpec, Shim, Verb};
use crate::state::AppState;

const SPECIALIZATION_KEYS: &[(&str, &str)] = &[("Id", "id"), ("Name", "name"), ("Description", "description")];

fn report_summary_placeholder() -> Value {
    json!({
        "totalPatients": 0,
        "totalAppointments": 0,
        "totalVisits": 0,
        "totalRevenue": 0,
        "appointmentsByStatus": [],
        "visitsByDoctor": []
    })
}

pub static ROUTES: &[RouteSpec] = &[
    // Roles
    RouteSpec::get("roles.list", "/api/roles", "/Roles", Problem).fallback("Failed to fetch roles"),
    RouteSpec::get("roles.get", "/api/roles/:id", "/Roles/{id}", Problem).fallback("Failed to fetch role"),
    RouteSpec::post("roles.create", "/api/roles", "/Roles", Problem)
        .required(&["name"])
        .trim(&["name", "description"])
        .fallback("Failed to create role")
        .success_message("Role created successfully"),
    RouteSpec::put("roles.update", "/api/roles/:id", "/Roles/{id}", Problem)
        .inject(&[("id", "id")])
        .required(&["name"])
        .trim(&["name", "description"])
        .fallback("Failed to update role")
        .success_message("Role updated successfully"),
    RouteSpec::delete("roles.delete", "/api/roles/:id", "/Roles/{id}", Problem)
        .fallback("Failed to delete role")
        .success_message("Role deleted successfully"),
    // Specializations
    RouteSpec::get("specializations.list", "/api/specializations", "/DoctorSpecialization", Problem)
        .reshape(Reshape::RenameKeys(SPECIALIZATION_KEYS))
        .fallback("Failed to fetch specializations"),
    RouteSpec::post("specializations.create", "/api/specializations", "/DoctorSpecialization", Problem)
        .required(&["name"])
        .trim(&["name", "description"])
        .reshape(Reshape::RenameKeys(SPECIALIZATION_KEYS))
        .fallback("Failed to create specialization")
        .success_message("Specialization created successfully"),
    RouteSpec::put("specializations.update", "/api/specializations/:id", "/DoctorSpecialization/{id}", Problem)
        .inject(&[("id", "id")])
        .required(&["name"])
        .trim(&["name", "description"])
        .reshape(Reshape::RenameKeys(SPECIALIZATION_KEYS))
        .fallback("Failed to update specialization")
        .success_message("Specialization updated successfully"),
    RouteSpec::delete("specializations.delete", "/api/specializations/:id", "/DoctorSpecialization/{id}", Problem)
        .fallback("Failed to delete specialization")
        .success_message("Specialization deleted successfully"),
    // Appointments
    RouteSpec::get("appointments.list", "/api/appointments", "/Appointment", Message)
        .fallback("Failed to fetch appointments"),
    RouteSpec::get("appointments.types", "/api/appointments/types", "/Dropdown/appointment-types", Message)
        .fallback("Failed to fetch appointment types"),
    RouteSpec::get("appointments.get", "/api/appointments/:id", "/Appointment/{id}", Message)
        .fallback("Failed to fetch appointment"),
    RouteSpec::post("appointments.create", "/api/appointments", "/Appointment", Message)
        .required(&["doctorId", "patientId", "typeId"])
        .trim(&["notes"])
        .fallback("Failed to create appointment")
        .success_message("Appointment created successfully"),
    RouteSpec::put("appointments.update", "/api/appointments/:id", "/Appointment/{id}", Message)
        .inject(&[("id", "id")])
        .required(&["doctorId", "patientId", "typeId"])
        .trim(&["notes"])
        .fallback("Failed to update appointment")
        .success_message("Appointment updated successfully"),
    RouteSpec::put("appointments.status", "/api/appointments/:id/status", "/Appointment/{id}/status", Message)
        .inject(&[("appointmentId", "id")])
        .required(&["status"])
        .fallback("Failed to update appointment status")
        .success_message("Appointment status updated"),
    RouteSpec::delete("appointments.delete", "/api/appointments/:id", "/Appointment/{id}", Message)
        .fallback("Failed to delete appointment")
        .success_message("Appointment deleted successfully"),
    // Visits
    RouteSpec::get("visits.get", "/api/visits/:id", "/Visit/{id}", Message).fallback("Failed to fetch visit"),
    RouteSpec::put("visits.update", "/api/visits/:id", "/Visit/{id}", Message)
        .inject(&[("id", "id")])
        .trim(&["notes"])
        .fallback("Failed to update visit")
        .success_message("Visit updated successfully"),
    RouteSpec::get("visits.by_patient", "/api/visits/patient/:patientId", "/Visit/patient/{patientId}", Message)
        .shim(Shim::EmptyListOn(&[404]))
        .fallback("Failed to fetch patient visits"),
    // Visit details
    RouteSpec::get("visits.complaints.list", "/api/visits/:id/complaints", "/VisitComplaint/visit/{id}", Message)
        .fallback("Failed to fetch complaints"),
    RouteSpec::post("visits.complaints.create", "/api/visits/:id/complaints", "/VisitComplaint", Message)
        .inject(&[("visitId", "id")])
        .required(&["visitId", "complaint"])
        .trim(&["complaint"])
        .fallback("Failed to add complaint"),
    RouteSpec::delete("visits.complaints.delete", "/api/visits/:id/complaints/:itemId", "/VisitComplaint/{itemId}", Message)
        .fallback("Failed to delete complaint"),
    RouteSpec::get("visits.diagnoses.list", "/api/visits/:id/diagnoses", "/VisitDiagnose/visit/{id}", Message)
        .fallback("Failed to fetch diagnoses"),
    RouteSpec::post("visits.diagnoses.create", "/api/visits/:id/diagnoses", "/VisitDiagnose", Message)
        .inject(&[("visitId", "id")])
        .required(&["visitId", "diagnosis"])
        .trim(&["diagnosis"])
        .fallback("Failed to add diagnosis"),
    RouteSpec::delete("visits.diagnoses.delete", "/api/visits/:id/diagnoses/:itemId", "/VisitDiagnose/{itemId}", Message)
        .fallback("Failed to delete diagnosis"),
    RouteSpec::get("visits.lab_tests.list", "/api/visits/:id/lab-tests", "/VisitLabTest/visit/{id}", Message)
        .fallback("Failed to fetch lab tests"),
    RouteSpec::post("visits.lab_tests.create", "/api/visits/:id/lab-tests", "/VisitLabTest", Message)
        .inject(&[("visitId", "id")])
        .required(&["visitId", "labTestId"])
        .trim(&["notes"])
        .fallback("Failed to add lab test"),
    RouteSpec::delete("visits.lab_tests.delete", "/api/visits/:id/lab-tests/:itemId", "/VisitLabTest/{itemId}", Message)
        .fallback("Failed to delete lab test"),
    RouteSpec::get("visits.prescriptions.list", "/api/visits/:id/prescriptions", "/VisitPrescription/visit/{id}", Message)
        .fallback("Failed to fetch prescriptions"),
    RouteSpec::post("visits.prescriptions.create", "/api/visits/:id/prescriptions", "/VisitPrescription", Message)
        .inject(&[("visitId", "id")])
        .required(&["visitId", "medicineName"])
        .trim(&["medicineName", "dosage", "instructions"])
        .fallback("Failed to add prescription"),
    RouteSpec::delete("visits.prescriptions.delete", "/api/visits/:id/prescriptions/:itemId", "/VisitPrescription/{itemId}", Message)
        .fallback("Failed to delete prescription"),
    RouteSpec::get("visits.procedures.list", "/api/visits/:id/procedures", "/VisitProcedure/visit/{id}", Message)
        .fallback("Failed to fetch procedures"),
    RouteSpec::post("visits.procedures.create", "/api/visits/:id/procedures", "/VisitProcedure", Message)
        .inject(&[("visitId", "id")])
        .required(&["visitId", "procedureId"])
        .trim(&["notes"])
        .fallback("Failed to add procedure"),
    RouteSpec::delete("visits.procedures.delete", "/api/visits/:id/procedures/:itemId", "/VisitProcedure/{itemId}", Message)
        .fallback("Failed to delete procedure"),
    RouteSpec::get("visits.radiology.list", "/api/visits/:id/radiology", "/VisitRadiology/visit/{id}", Message)
        .fallback("Failed to fetch radiology requests"),
    RouteSpec::post("visits.radiology.create", "/api/visits/:id/radiology", "/VisitRadiology", Message)
        .inject(&[("visitId", "id")])
        .required(&["visitId", "radiologyTestId"])
        .trim(&["notes"])
        .fallback("Failed to add radiology request"),
    RouteSpec::delete("visits.radiology.delete", "/api/visits/:id/radiology/:itemId", "/VisitRadiology/{itemId}", Message)
        .fallback("Failed to delete radiology request"),
    // Patients
    RouteSpec::get("patients.list", "/api/patients", "/Patient", Message).fallback("Failed to fetch patients"),
    RouteSpec::get("patients.search", "/api/patients/search", "/Patient/search", Message)
        .fallback("Failed to search patients"),
    RouteSpec::get("patients.get", "/api/patients/:id", "/Patient/{id}", Message).fallback("Failed to fetch patient"),
    RouteSpec::post("patients.create", "/api/patients", "/Patient", Message)
        .required(&["firstName", "lastName"])
        .trim(&["firstName", "lastName", "phoneNumber", "email", "address"])
        .fallback("Failed to create patient")
        .success_message("Patient created successfully"),
    RouteSpec::put("patients.update", "/api/patients/:id", "/Patient/{id}", Message)
        .inject(&[("id", "id")])
        .required(&["firstName", "lastName"])
        .trim(&["firstName", "lastName", "phoneNumber", "email", "address"])
        .fallback("Failed to update patient")
        .success_message("Patient updated successfully"),
    RouteSpec::delete("patients.delete", "/api/patients/:id", "/Patient/{id}", Message)
        .fallback("Failed to delete patient")
        .success_message("Patient deleted successfully"),
    RouteSpec::get("patients.photo", "/api/patients/:id/photo", "/Patient/{id}/photo", Message)
        .binary()
        .fallback("Failed to fetch patient photo"),
    // Users
    RouteSpec::get("users.list", "/api/users", "/Users", Problem).fallback("Failed to fetch users"),
    RouteSpec::get("users.get", "/api/users/:id", "/Users/{id}", Problem).fallback("Failed to fetch user"),
    // Dropdowns
    RouteSpec::get("dropdown.get", "/api/dropdown/:kind", "/Dropdown/{kind}", Message)
        .cacheable()
        .fallback("Failed to fetch dropdown options"),
    // Doctor availability
    RouteSpec::get("availability.list", "/api/doctor-availability", "/doctor-availability", Message)
        .fallback("Failed to fetch doctor availability"),
    RouteSpec::get(
        "availability.by_doctor",
        "/api/doctor-availability/doctor/:doctorId",
        "/doctor-availability/doctor/{doctorId}",
        Message,
    )
    .shim(Shim::EmptyListOn(&[404]))
    .fallback("Failed to fetch doctor availability"),
    RouteSpec::post("availability.create", "/api/doctor-availability", "/doctor-availability", Message)
        .required(&["doctorId", "dayOfWeek", "startTime", "endTime"])
        .fallback("Failed to create availability")
        .success_message("Availability created successfully"),
    RouteSpec::put("availability.update", "/api/doctor-availability/:id", "/doctor-availability/{id}", Message)
        .inject(&[("id", "id")])
        .required(&["doctorId", "dayOfWeek", "startTime", "endTime"])
        .fallback("Failed to update availability")
        .success_message("Availability updated successfully"),
    RouteSpec::delete("availability.delete", "/api/doctor-availability/:id", "/doctor-availability/{id}", Message)
        .fallback("Failed to delete availability")
        .success_message("Availability deleted successfully"),
    // Doctor slots
    RouteSpec::get("slots.by_doctor", "/api/doctor-slots/:doctorId", "/Doctor/slots/{doctorId}", Message)
        .shim(Shim::EmptyListOn(&[400, 404]))
        .fallback("Failed to fetch doctor slots"),
    // Reports
    RouteSpec::get("reports.summary", "/api/reports/summary", "/Reports/summary", Message)
        .shim(Shim::MockOn(&[404], report_summary_placeholder))
        .fallback("Failed to fetch report summary"),
];

/// Look up a table entry by name.
pub fn route(name: &str) -> Option<&'static RouteSpec> {
    ROUTES.iter().find(|spec| spec.name == name)
}

fn method_router(spec: &'static RouteSpec) -> MethodRouter<AppState> {
    let handler = move |State(state): State<AppState>,
                        params: Option<Path<HashMap<String, String>>>,
                        RawQuery(query): RawQuery,
                        headers: HeaderMap,
                        body: Bytes| async move {
        let request = GatewayRequest {
            headers,
            params: params.map(|Path(p)| p).unwrap_or_default(),
            query,
            body,
        };
        state.gateway.forward(spec, request).await
    };

    match spec.verb {
        Verb::Get => get(handler),
        Verb::Post => post(handler),
        Verb::Put => put(handler),
        Verb::Delete => delete(handler),
    }
}

/// Router with every table entry mounted. Entries sharing a path merge their methods.
pub fn routes() -> Router<AppState> {
    ROUTES
        .iter()
        .fold(Router::new(), |router, spec| router.route(spec.path, method_router(spec)))
}
