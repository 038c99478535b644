//! Minimal typed FHIR R4 resource model
//!
//! Only the members the discovery pipeline reads are typed. Every other JSON
//! member is kept in a flattened `extra` map, so a record round-trips unchanged
//! into the execution context handed to the rule engine.
//!
//! [`Resource`] (de)serializes by its `resourceType` member. Types without a
//! typed model are carried as [`GenericResource`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// A code from a terminology system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Coding {
    /// Creates a coding with a system and a code
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            ..Default::default()
        }
    }
}

/// A set of codings, optionally with free text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CodeableConcept {
    /// Creates a concept with a single coding
    pub fn single(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            coding: vec![Coding::new(system, code)],
            ..Default::default()
        }
    }
}

/// A reference from one resource to another
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reference {
    /// Creates a relative reference (`Type/id`)
    pub fn to(resource_type: &str, id: &str) -> Self {
        Self {
            reference: Some(format!("{resource_type}/{id}")),
            ..Default::default()
        }
    }
}

/// Collects the `reference` strings of a record's declared reference fields
fn reference_strings<'a>(
    single: impl IntoIterator<Item = Option<&'a Reference>>,
    many: impl IntoIterator<Item = &'a Reference>,
) -> Vec<&'a str> {
    single
        .into_iter()
        .flatten()
        .chain(many)
        .filter_map(|r| r.reference.as_deref())
        .collect()
}

/// Appends a reference unless an equal reference string is already present
fn push_unique(references: &mut Vec<Reference>, reference: Reference) -> bool {
    let exists = references
        .iter()
        .any(|r| r.reference.is_some() && r.reference == reference.reference);
    if !exists {
        references.push(reference);
    }
    !exists
}

/// Reference-typed R4 paths of each order kind that are not typed members
///
/// They are read from the flattened `extra` map, so every reference an order
/// holds is visible to backfill.
const DEVICE_REQUEST_REFERENCES: &[&str] = &[
    "basedOn",
    "priorRequest",
    "encounter",
    "reasonReference",
    "supportingInfo",
    "relevantHistory",
];

const MEDICATION_REQUEST_REFERENCES: &[&str] = &[
    "reportedReference",
    "encounter",
    "supportingInformation",
    "recorder",
    "reasonReference",
    "basedOn",
    "dispenseRequest.performer",
    "priorPrescription",
    "detectedIssue",
    "eventHistory",
];

const MEDICATION_DISPENSE_REFERENCES: &[&str] = &[
    "partOf",
    "context",
    "supportingInformation",
    "performer.actor",
    "location",
    "receiver",
    "destination",
    "substitution.responsibleParty",
    "detectedIssue",
    "eventHistory",
];

const SERVICE_REQUEST_REFERENCES: &[&str] = &[
    "basedOn",
    "replaces",
    "encounter",
    "locationReference",
    "reasonReference",
    "supportingInfo",
    "specimen",
    "relevantHistory",
];

const MEDICATION_STATEMENT_REFERENCES: &[&str] = &[
    "basedOn",
    "partOf",
    "context",
    "informationSource",
    "derivedFrom",
    "reasonReference",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Insurance coverage; the payor references name the paying organizations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payor: Vec<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Coverage {
    pub fn references(&self) -> Vec<&str> {
        reference_strings([self.beneficiary.as_ref()], &self.payor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PractitionerRole {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practitioner: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PractitionerRole {
    pub fn references(&self) -> Vec<&str> {
        reference_strings(
            [self.practitioner.as_ref(), self.organization.as_ref()],
            &self.location,
        )
    }
}

/// Order for a medical device (e.g. home oxygen equipment)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_codeable_concept: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_reference: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performer: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insurance: Vec<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceRequest {
    pub fn references(&self) -> Vec<&str> {
        let mut references = reference_strings(
            [
                self.subject.as_ref(),
                self.requester.as_ref(),
                self.performer.as_ref(),
                self.code_reference.as_ref(),
            ],
            &self.insurance,
        );
        collect_paths(&self.extra, DEVICE_REQUEST_REFERENCES, &mut references);
        references
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_codeable_concept: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_reference: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performer: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insurance: Vec<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MedicationRequest {
    pub fn references(&self) -> Vec<&str> {
        let mut references = reference_strings(
            [
                self.subject.as_ref(),
                self.requester.as_ref(),
                self.performer.as_ref(),
                self.medication_reference.as_ref(),
            ],
            &self.insurance,
        );
        collect_paths(&self.extra, MEDICATION_REQUEST_REFERENCES, &mut references);
        references
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationDispense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_codeable_concept: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_reference: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorizing_prescription: Vec<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MedicationDispense {
    pub fn references(&self) -> Vec<&str> {
        let mut references = reference_strings(
            [self.subject.as_ref(), self.medication_reference.as_ref()],
            &self.authorizing_prescription,
        );
        collect_paths(&self.extra, MEDICATION_DISPENSE_REFERENCES, &mut references);
        references
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performer: Vec<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insurance: Vec<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServiceRequest {
    pub fn references(&self) -> Vec<&str> {
        let mut references =
            reference_strings([self.subject.as_ref(), self.requester.as_ref()], &self.performer);
        references.extend(reference_strings(std::iter::empty(), &self.insurance));
        collect_paths(&self.extra, SERVICE_REQUEST_REFERENCES, &mut references);
        references
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_codeable_concept: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_reference: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MedicationStatement {
    pub fn references(&self) -> Vec<&str> {
        let mut references = reference_strings(
            [self.subject.as_ref(), self.medication_reference.as_ref()],
            std::iter::empty(),
        );
        collect_paths(&self.extra, MEDICATION_STATEMENT_REFERENCES, &mut references);
        references
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
    History,
    Searchset,
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntryRequest {
    pub method: HttpVerb,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleEntryResponse {
    #[serde(default)]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleEntryRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<BundleEntryResponse>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BundleEntry {
    /// Entry carrying a resource
    pub fn with_resource(resource: impl Into<Resource>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Default::default()
        }
    }

    /// Entry carrying a batch request line
    pub fn with_request(method: HttpVerb, url: impl Into<String>) -> Self {
        Self {
            request: Some(BundleEntryRequest {
                method,
                url: url.into(),
            }),
            ..Default::default()
        }
    }
}

/// A container of resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<BundleType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bundle {
    /// Creates an empty bundle of the given type
    pub fn of_type(bundle_type: BundleType) -> Self {
        Self {
            bundle_type: Some(bundle_type),
            ..Default::default()
        }
    }

    /// Creates a collection bundle holding the given resources
    pub fn collection<I, R>(resources: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Resource>,
    {
        Self {
            bundle_type: Some(BundleType::Collection),
            entry: resources.into_iter().map(BundleEntry::with_resource).collect(),
            ..Default::default()
        }
    }

    /// Resources of all entries, in entry order
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.entry.iter().filter_map(|e| e.resource.as_ref())
    }

    /// Appends an entry carrying the resource
    pub fn push(&mut self, resource: impl Into<Resource>) {
        self.entry.push(BundleEntry::with_resource(resource));
    }

    pub fn references(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl Patient {
    pub fn references(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl Organization {
    pub fn references(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// Reference fields of an order type without a typed model
///
/// Paths are dot-separated member names; arrays are traversed at every step.
struct GenericSchema {
    resource_type: &'static str,
    references: &'static [&'static str],
    subject: Option<&'static str>,
}

const GENERIC_SCHEMAS: &[GenericSchema] = &[
    GenericSchema {
        resource_type: "NutritionOrder",
        references: &["patient", "orderer", "encounter"],
        subject: Some("patient"),
    },
    GenericSchema {
        resource_type: "SupplyRequest",
        references: &["requester", "deliverFrom", "deliverTo", "itemReference"],
        subject: None,
    },
    GenericSchema {
        resource_type: "Appointment",
        references: &["participant.actor", "basedOn"],
        subject: None,
    },
    GenericSchema {
        resource_type: "Encounter",
        references: &["subject", "participant.individual", "serviceProvider", "basedOn"],
        subject: Some("subject"),
    },
];

/// Appends the references found at each dot-separated path of `body`
fn collect_paths<'a>(body: &'a Map<String, Value>, paths: &[&str], out: &mut Vec<&'a str>) {
    for path in paths {
        let segments: Vec<&str> = path.split('.').collect();
        if let Some((head, rest)) = segments.split_first() {
            if let Some(value) = body.get(*head) {
                collect_path(value, rest, out);
            }
        }
    }
}

fn collect_path<'a>(value: &'a Value, path: &[&str], out: &mut Vec<&'a str>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_path(item, path, out)),
        Value::Object(map) => match path.split_first() {
            Some((head, rest)) => {
                if let Some(next) = map.get(*head) {
                    collect_path(next, rest, out);
                }
            }
            None => {
                if let Some(reference) = map.get("reference").and_then(Value::as_str) {
                    out.push(reference);
                }
            }
        },
        _ => {}
    }
}

/// Any resource without a typed model, kept as its raw JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct GenericResource {
    pub resource_type: String,
    pub body: Map<String, Value>,
}

impl GenericResource {
    /// Creates a generic resource from a JSON body (without `resourceType`)
    pub fn new(resource_type: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            resource_type: resource_type.into(),
            body,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.body.get("id").and_then(Value::as_str)
    }

    fn schema(&self) -> Option<&'static GenericSchema> {
        GENERIC_SCHEMAS
            .iter()
            .find(|s| s.resource_type == self.resource_type)
    }

    /// References held in the declared reference fields of this type
    ///
    /// Types without a declared schema yield no references.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(schema) = self.schema() {
            collect_paths(&self.body, schema.references, &mut out);
        }
        out
    }

    fn link_subject(&mut self, reference: Reference) -> bool {
        let Some(field) = self.schema().and_then(|s| s.subject) else {
            return false;
        };
        match serde_json::to_value(reference) {
            Ok(value) => {
                self.body.insert(field.to_string(), value);
                true
            }
            Err(_) => false,
        }
    }
}

macro_rules! resource_kinds {
    ($($kind:ident),* $(,)?) => {
        /// A FHIR resource, dispatched on its `resourceType`
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(try_from = "Value", into = "Value")]
        pub enum Resource {
            $($kind($kind),)*
            Generic(GenericResource),
        }

        impl Resource {
            /// The `resourceType` of this resource
            pub fn resource_type(&self) -> &str {
                match self {
                    $(Resource::$kind(_) => stringify!($kind),)*
                    Resource::Generic(generic) => &generic.resource_type,
                }
            }

            /// Logical id, when present
            pub fn id(&self) -> Option<&str> {
                match self {
                    $(Resource::$kind(inner) => inner.id.as_deref(),)*
                    Resource::Generic(generic) => generic.id(),
                }
            }

            /// References held in the declared reference fields of this resource
            pub fn references(&self) -> Vec<&str> {
                match self {
                    $(Resource::$kind(inner) => inner.references(),)*
                    Resource::Generic(generic) => generic.references(),
                }
            }

            fn from_parts(resource_type: &str, body: Map<String, Value>) -> Result<Self, String> {
                match resource_type {
                    $(stringify!($kind) => typed_body::<$kind>(resource_type, body).map(Resource::$kind),)*
                    _ => Ok(Resource::Generic(GenericResource::new(resource_type, body))),
                }
            }

            fn into_body(self) -> (String, Map<String, Value>) {
                match self {
                    $(Resource::$kind(inner) => (stringify!($kind).to_string(), json_body(&inner)),)*
                    Resource::Generic(generic) => (generic.resource_type, generic.body),
                }
            }
        }

        $(
            impl ResourceKind for $kind {
                const RESOURCE_TYPE: &'static str = stringify!($kind);

                fn from_resource(resource: &Resource) -> Option<&Self> {
                    match resource {
                        Resource::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn id(&self) -> Option<&str> {
                    self.id.as_deref()
                }
            }

            impl From<$kind> for Resource {
                fn from(value: $kind) -> Self {
                    Resource::$kind(value)
                }
            }
        )*
    };
}

/// A typed resource model that can be extracted from a [`Resource`]
pub trait ResourceKind: Sized {
    /// The `resourceType` this model represents
    const RESOURCE_TYPE: &'static str;

    /// Borrows the typed record when the resource is of this kind
    fn from_resource(resource: &Resource) -> Option<&Self>;

    /// Logical id, when present
    fn id(&self) -> Option<&str>;
}

resource_kinds!(
    Patient,
    Organization,
    Coverage,
    PractitionerRole,
    DeviceRequest,
    MedicationRequest,
    MedicationDispense,
    ServiceRequest,
    MedicationStatement,
    Bundle,
);

fn typed_body<T: DeserializeOwned>(resource_type: &str, body: Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(body)).map_err(|e| format!("Invalid {resource_type}: {e}"))
}

fn json_body<T: Serialize>(inner: &T) -> Map<String, Value> {
    match serde_json::to_value(inner) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

impl Resource {
    /// Points the record's subject (patient) at the given reference
    ///
    /// Returns `false` for resource types without a subject field.
    pub fn link_subject(&mut self, reference: Reference) -> bool {
        match self {
            Resource::DeviceRequest(r) => r.subject = Some(reference),
            Resource::MedicationRequest(r) => r.subject = Some(reference),
            Resource::MedicationDispense(r) => r.subject = Some(reference),
            Resource::ServiceRequest(r) => r.subject = Some(reference),
            Resource::MedicationStatement(r) => r.subject = Some(reference),
            Resource::Generic(generic) => return generic.link_subject(reference),
            _ => return false,
        }
        true
    }

    /// Adds a coverage reference to the record's insurance list
    ///
    /// Returns `false` when the type has no insurance field or the reference
    /// is already listed.
    pub fn link_insurance(&mut self, reference: Reference) -> bool {
        match self {
            Resource::DeviceRequest(r) => push_unique(&mut r.insurance, reference),
            Resource::MedicationRequest(r) => push_unique(&mut r.insurance, reference),
            Resource::ServiceRequest(r) => push_unique(&mut r.insurance, reference),
            _ => false,
        }
    }

    /// Whether the resource is an `OperationOutcome`
    pub fn is_operation_outcome(&self) -> bool {
        self.resource_type() == "OperationOutcome"
    }

    /// Borrows the typed record of kind `T`
    pub fn as_kind<T: ResourceKind>(&self) -> Option<&T> {
        T::from_resource(self)
    }
}

impl TryFrom<Value> for Resource {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut body) = value else {
            return Err("FHIR resource must be a JSON object".to_string());
        };
        let resource_type = match body.remove("resourceType") {
            Some(Value::String(resource_type)) => resource_type,
            _ => return Err("FHIR resource is missing resourceType".to_string()),
        };
        Resource::from_parts(&resource_type, body)
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        let (resource_type, body) = resource.into_body();
        let mut map = Map::with_capacity(body.len() + 1);
        map.insert("resourceType".to_string(), Value::String(resource_type));
        map.extend(body);
        Value::Object(map)
    }
}
