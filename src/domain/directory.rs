use std::collections::HashMap;

/// Everything known about a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    /// Display name
    pub name: String,
    /// Wealth of the client ("avere detinuta")
    pub avere_detinuta: String,
    /// Role of the client within their company ("functie in companie")
    pub functie_in_companie: String,
}

/// Everything known about a company
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    /// Display name
    pub name: String,
    /// Estimated valuation ("valoare estimata")
    pub valoare_estimata: String,
    /// Headcount ("numar de angajati")
    pub numar_de_angajati: String,
}

/// Source of subject data
///
/// Lookups are case-insensitive.
pub trait SubjectDirectory {
    /// Looks up a client by name
    fn client(&self, name: &str) -> Option<ClientRecord>;

    /// Looks up a company by name
    fn company(&self, name: &str) -> Option<CompanyRecord>;
}

/// [`SubjectDirectory`] backed by in-memory tables
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    clients: HashMap<String, ClientRecord>,
    companies: HashMap<String, CompanyRecord>,
}

impl StaticDirectory {
    /// Creates a directory knowing the client `Elon Musk` and the company `Tesla`
    pub fn seeded() -> Self {
        Self::default()
            .with_client(ClientRecord {
                name: "Elon Musk".into(),
                avere_detinuta: "$USD 10,000,000".into(),
                functie_in_companie: "CEO".into(),
            })
            .with_company(CompanyRecord {
                name: "Tesla".into(),
                valoare_estimata: "$USD 70,000,000".into(),
                numar_de_angajati: "25,000".into(),
            })
    }

    /// Adds or replaces a client
    pub fn with_client(mut self, record: ClientRecord) -> Self {
        self.clients.insert(record.name.to_lowercase(), record);
        self
    }

    /// Adds or replaces a company
    pub fn with_company(mut self, record: CompanyRecord) -> Self {
        self.companies.insert(record.name.to_lowercase(), record);
        self
    }
}

impl SubjectDirectory for StaticDirectory {
    fn client(&self, name: &str) -> Option<ClientRecord> {
        self.clients.get(&name.to_lowercase()).cloned()
    }

    fn company(&self, name: &str) -> Option<CompanyRecord> {
        self.companies.get(&name.to_lowercase()).cloned()
    }
}
