// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Customer resource
//!
//! | Endpoint | Concept | Versions | Default | max-age |
//! |---|---|---|---|---|
//! | list | `customers` | 1 | 1 | 10 s |
//! | get | `customer` | 1, 2 | 2 | 120 s (v1), 60 s (v2) |
//! | create or update | `customer` | 2 | | 30 s |

use std::sync::Arc;

use archivist::{CustomerArchivist, ListQuery};
use axum::response::Response;
use pipeline::{MediaTypeGrammar, PipelineResult, Preconditions};
use shared_types::{Customer, CustomerNumber};
use tracing::info;

use super::{ProducerTable, Producers, Resource, ResourceSettings, instrumented, negotiate, record};
use crate::{
    error::{ServerError, ServerResult},
    extractors::RequestContext,
    representations::{CustomerRepresentation, CustomerUpdate, CustomersRepresentation, customer_path},
};

/// Customers, listed and addressed by customer number
#[derive(Debug)]
pub struct CustomerResource {
    archivist: Arc<dyn CustomerArchivist>,
    settings: ResourceSettings,
    list_producers: Producers<Self, ListQuery>,
    item_producers: Producers<Self, CustomerNumber>,
}

impl Resource for CustomerResource {
    const NAME: &'static str = "CustomerResource";

    fn settings(&self) -> &ResourceSettings {
        &self.settings
    }
}

impl CustomerResource {
    /// Create the resource and its dispatch tables
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if a media type cannot be encoded or is
    /// registered twice.
    pub fn new(archivist: Arc<dyn CustomerArchivist>, settings: ResourceSettings) -> PipelineResult<Self> {
        let list_producers = ProducerTable::<Self, ListQuery>::new()
            .default_type("list_v1", Self::list_v1)
            .version("customers", "1", "list_v1", Self::list_v1)?
            .build()?;
        let item_producers = ProducerTable::<Self, CustomerNumber>::new()
            .default_type("get_v2", Self::get_v2)
            .version("customer", "1", "get_v1", Self::get_v1)?
            .version("customer", "2", "get_v2", Self::get_v2)?
            .build()?;

        Ok(Self {
            archivist,
            settings,
            list_producers,
            item_producers,
        })
    }

    /// List customers in the representation negotiated from `Accept`
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the archivist or the response pipeline fails
    pub fn list(&self, context: &RequestContext, query: &ListQuery) -> ServerResult<Response> {
        negotiate(
            self,
            &self.list_producers,
            context,
            query,
            &[&query.offset, &query.effective_limit()],
        )
    }

    /// Get a customer in the representation negotiated from `Accept`
    ///
    /// # Errors
    ///
    /// Returns `ServerError::NotFound` if the customer does not exist
    pub fn get(&self, context: &RequestContext, number: &CustomerNumber) -> ServerResult<Response> {
        negotiate(self, &self.item_producers, context, number, &[number])
    }

    /// Create or update the customer at `number`
    ///
    /// Answers `201 Created` for a new customer and `200 OK` for an update,
    /// both with a `Location` header and the version 2 representation.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ValidationError` if the body's number differs
    /// from the path.
    pub fn create_or_update(
        &self,
        context: &RequestContext,
        number: &CustomerNumber,
        update: CustomerUpdate,
    ) -> ServerResult<Response> {
        let result = self.store(context, number, update);
        record(Self::NAME, &result);
        result
    }

    /// Media types served by the item endpoint
    pub fn item_media_types(&self) -> Vec<&str> {
        self.item_producers.media_types()
    }

    fn store(
        &self,
        context: &RequestContext,
        number: &CustomerNumber,
        update: CustomerUpdate,
    ) -> ServerResult<Response> {
        if update.number != number.as_str() {
            return Err(ServerError::ValidationError(format!(
                "customer number '{}' in body does not match '{number}' in path",
                update.number
            )));
        }

        instrumented(self, "create_or_update", &[number], || {
            let (customer, created) = match self.archivist.find_customer(number)? {
                Some(mut existing) => {
                    existing.first_name = update.first_name;
                    existing.middle_name = update.middle_name;
                    existing.surname = update.surname;
                    (existing, false)
                }
                None => (
                    Customer::new(
                        number.clone(),
                        update.first_name,
                        update.middle_name,
                        update.surname,
                    ),
                    true,
                ),
            };
            let saved = self.archivist.save_customer(customer)?;
            info!(%number, created, log_token = %context.log_token(), "Stored customer");

            let location = customer_path(number);
            let builder = self
                .settings
                .respond_with(context, saved, CustomerRepresentation::new)
                .concept("customer")
                .version("2")
                .max_age(30);
            let builder = if created {
                builder.created(location)
            } else {
                builder.location(location)
            };
            Ok(builder.build(&Preconditions::none())?)
        })
    }

    fn list_v1(
        &self,
        context: &RequestContext,
        query: &ListQuery,
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let customers = self.archivist.list_customers(query)?;
        Ok(self
            .settings
            .respond_with(context, customers, |customers: &Vec<Customer>| {
                CustomersRepresentation::new(customers)
            })
            .concept("customers")
            .version("1")
            .grammar(grammar)
            .max_age(10)
            .build(context.preconditions())?)
    }

    fn get_v1(
        &self,
        context: &RequestContext,
        number: &CustomerNumber,
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        self.customer(context, number, grammar, "1", 120)
    }

    fn get_v2(
        &self,
        context: &RequestContext,
        number: &CustomerNumber,
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        self.customer(context, number, grammar, "2", 60)
    }

    // Both versions share the representation and differ in cache lifetime
    fn customer(
        &self,
        context: &RequestContext,
        number: &CustomerNumber,
        grammar: MediaTypeGrammar,
        version: &str,
        max_age: u32,
    ) -> ServerResult<Response> {
        let customer = self.archivist.get_customer(number)?;
        Ok(self
            .settings
            .respond_with(context, customer, CustomerRepresentation::new)
            .concept("customer")
            .version(version)
            .grammar(grammar)
            .max_age(max_age)
            .build(context.preconditions())?)
    }
}

#[cfg(test)]
mod tests {
    use archivist::ArchivistError;
    use axum::http::{StatusCode, header};
    use chrono::{DateTime, Utc};
    use pipeline::{EntityTag, LogToken};

    use super::*;
    use crate::resources::mocks::{MockCustomers, context};

    fn number() -> CustomerNumber {
        "0123456789".parse().expect("valid number")
    }

    fn hans() -> Customer {
        let mut customer = Customer::new(number(), "Hans", "Peter", "Hansen");
        customer.audit.stamp(
            "system",
            DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
        );
        customer
    }

    fn resource(archivist: MockCustomers) -> CustomerResource {
        CustomerResource::new(Arc::new(archivist), ResourceSettings::default())
            .expect("tables build")
    }

    fn header_value<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|value| value.to_str().ok())
    }

    async fn body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    #[test]
    fn item_endpoint_registers_five_media_types() {
        let resource = resource(MockCustomers::new());
        assert_eq!(
            resource.item_media_types(),
            vec![
                "application/hal+json",
                "application/hal+json+customer+v1",
                "application/hal+json+customer+v2",
                "application/hal+json;concept=customer;v=1",
                "application/hal+json;concept=customer;v=2",
            ]
        );
    }

    #[tokio::test]
    async fn version_one_is_served_with_its_cache_lifetime() {
        let mut archivist = MockCustomers::new();
        archivist
            .expect_get_customer()
            .times(1)
            .returning(|_| Ok(hans()));

        let response = resource(archivist)
            .get(&context("application/hal+json;concept=customer;v=1"), &number())
            .expect("customer is found");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_value(&response, header::CONTENT_TYPE.as_str()),
            Some("application/hal+json;concept=customer;v=1")
        );
        assert_eq!(
            header_value(&response, header::CACHE_CONTROL.as_str()),
            Some("max-age=120")
        );
        assert_eq!(
            header_value(&response, header::LAST_MODIFIED.as_str()),
            Some("Thu, 02 Jan 2025 03:04:05 GMT")
        );
        assert_eq!(header_value(&response, "x-log-token"), Some("test-token"));

        let body = body(response).await;
        assert_eq!(body["surname"], "Hansen");
        assert_eq!(body["_links"]["self"]["href"], "/customers/0123456789");
    }

    #[test]
    fn bare_hal_json_selects_version_two() {
        let mut archivist = MockCustomers::new();
        archivist.expect_get_customer().returning(|_| Ok(hans()));

        let response = resource(archivist)
            .get(&context("application/hal+json"), &number())
            .expect("customer is found");

        assert_eq!(
            header_value(&response, header::CONTENT_TYPE.as_str()),
            Some("application/hal+json;concept=customer;v=2")
        );
        assert_eq!(
            header_value(&response, header::CACHE_CONTROL.as_str()),
            Some("max-age=60")
        );
    }

    #[test]
    fn suffixed_accept_is_answered_in_suffixed_grammar() {
        let mut archivist = MockCustomers::new();
        archivist.expect_get_customer().returning(|_| Ok(hans()));

        let response = resource(archivist)
            .get(&context("application/hal+json+customer+v2"), &number())
            .expect("customer is found");

        assert_eq!(
            header_value(&response, header::CONTENT_TYPE.as_str()),
            Some("application/hal+json+customer+v2")
        );
    }

    #[test]
    fn unsupported_accept_never_reaches_the_archivist() {
        let mut archivist = MockCustomers::new();
        archivist.expect_get_customer().times(0);

        let response = resource(archivist)
            .get(&context("application/json"), &number())
            .expect("fallback answers");

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn matching_etag_answers_not_modified() {
        let mut archivist = MockCustomers::new();
        archivist
            .expect_get_customer()
            .times(1)
            .returning(|_| Ok(hans()));
        let context = RequestContext::new(
            "application/hal+json;concept=customer;v=2",
            Preconditions::none().with_if_none_match(EntityTag::of(&hans())),
            LogToken::from_supplied(Some("conditional")),
        );

        let response = resource(archivist)
            .get(&context, &number())
            .expect("conditional get answers");

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(header_value(&response, "x-log-token"), Some("conditional"));
    }

    #[test]
    fn missing_customer_is_not_found() {
        let mut archivist = MockCustomers::new();
        archivist
            .expect_get_customer()
            .returning(|number| Err(ArchivistError::not_found("customer", number)));

        let result = resource(archivist).get(&context("application/hal+json"), &number());

        assert!(matches!(result, Err(ServerError::NotFound { .. })));
    }

    #[test]
    fn list_window_is_passed_to_the_archivist() {
        let mut archivist = MockCustomers::new();
        archivist
            .expect_list_customers()
            .withf(|query| query.offset == 1 && query.effective_limit() == 2)
            .returning(|_| Ok(vec![hans()]));
        let query = ListQuery {
            offset: 1,
            limit: Some(2),
            sort: None,
        };

        let response = resource(archivist)
            .list(&context("application/hal+json;concept=customers;v=1"), &query)
            .expect("listing answers");

        assert_eq!(
            header_value(&response, header::CACHE_CONTROL.as_str()),
            Some("max-age=10")
        );
    }

    fn update(number: &str) -> CustomerUpdate {
        CustomerUpdate {
            number: number.to_string(),
            first_name: "Hans".to_string(),
            middle_name: String::new(),
            surname: "Hansen".to_string(),
        }
    }

    #[test]
    fn new_customer_is_created() {
        let mut archivist = MockCustomers::new();
        archivist.expect_find_customer().returning(|_| Ok(None));
        archivist
            .expect_save_customer()
            .withf(|customer| customer.middle_name.is_empty())
            .times(1)
            .returning(Ok);

        let response = resource(archivist)
            .create_or_update(&context(""), &number(), update("0123456789"))
            .expect("customer is stored");

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            header_value(&response, header::LOCATION.as_str()),
            Some("/customers/0123456789")
        );
        assert_eq!(
            header_value(&response, header::CONTENT_TYPE.as_str()),
            Some("application/hal+json;concept=customer;v=2")
        );
        assert_eq!(
            header_value(&response, header::CACHE_CONTROL.as_str()),
            Some("max-age=30")
        );
    }

    #[test]
    fn existing_customer_is_updated_in_place() {
        let mut archivist = MockCustomers::new();
        archivist.expect_find_customer().returning(|_| Ok(Some(hans())));
        archivist
            .expect_save_customer()
            .withf(|customer| customer.middle_name.is_empty() && customer.surname == "Hansen")
            .returning(Ok);

        let response = resource(archivist)
            .create_or_update(&context(""), &number(), update("0123456789"))
            .expect("customer is stored");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_value(&response, header::LOCATION.as_str()),
            Some("/customers/0123456789")
        );
    }

    #[test]
    fn mismatched_number_is_rejected_before_storage() {
        let mut archivist = MockCustomers::new();
        archivist.expect_find_customer().times(0);
        archivist.expect_save_customer().times(0);

        let result = resource(archivist).create_or_update(
            &context(""),
            &number(),
            update("1234567890"),
        );

        assert!(matches!(result, Err(ServerError::ValidationError(_))));
    }
}
