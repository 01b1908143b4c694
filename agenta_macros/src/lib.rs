mod completion_schema;
mod schema_extraction;

use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Declares a tool from a parameter type and an async closure.
///
/// ```ignore
/// travel_agenta::tool!(
///     name = "budget_calculator",
///     description = "Split a trip budget",
///     params = BudgetParams,
///     |params: BudgetParams| async move { Ok(serde_json::json!({})) }
/// );
/// ```
///
/// The generated unit struct is named after `name` in PascalCase. The closure
/// returns `Result<serde_json::Value, String>`; an `Err` becomes
/// `AgentError::ToolExecution`.
#[proc_macro]
pub fn tool(input: TokenStream) -> TokenStream {
    let ToolDefinition {
        name,
        description,
        params_type,
        execute_body,
    } = parse_macro_input!(input as ToolDefinition);

    let tool_struct = quote::format_ident!("{}", pascal_case(&name.value()));

    let expanded = quote! {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct #tool_struct;

        impl travel_agenta::tools::Tool for #tool_struct {
            fn name(&self) -> &'static str {
                #name
            }

            fn description(&self) -> &'static str {
                #description
            }

            fn parameters_schema(&self) -> serde_json::Value {
                let settings = schemars::gen::SchemaSettings::draft07().with(|s| {
                    s.inline_subschemas = true;
                    s.option_add_null_type = false;
                });
                let root = settings.into_generator().into_root_schema_for::<#params_type>();
                let mut schema = serde_json::to_value(&root.schema).unwrap_or_else(|_| {
                    serde_json::json!({ "type": "object", "properties": {} })
                });
                if let Some(object) = schema.as_object_mut() {
                    object.remove("title");
                }
                schema
            }

            fn execute(
                &self,
                parameters: serde_json::Value,
            ) -> std::pin::Pin<
                Box<
                    dyn std::future::Future<Output = Result<serde_json::Value, travel_agenta::AgentError>>
                        + Send
                        + '_,
                >,
            > {
                Box::pin(async move {
                    let params: #params_type = travel_agenta::Validator::SerdeFirst
                        .validate(parameters)
                        .map_err(|e| travel_agenta::AgentError::ToolExecution(
                            format!("Invalid parameters for {}: {}", #name, e)
                        ))?;

                    let handler = #execute_body;
                    handler(params)
                        .await
                        .map_err(travel_agenta::AgentError::ToolExecution)
                })
            }
        }
    };

    TokenStream::from(expanded)
}

fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

struct ToolDefinition {
    name: syn::LitStr,
    description: syn::LitStr,
    params_type: syn::Type,
    execute_body: syn::ExprClosure,
}

fn parse_named_assignment<T: syn::parse::Parse>(
    input: syn::parse::ParseStream,
    keyword: &str,
) -> syn::Result<T> {
    let ident: syn::Ident = input.parse()?;
    if ident != keyword {
        return Err(syn::Error::new_spanned(
            ident,
            format!("expected '{keyword}'"),
        ));
    }
    input.parse::<syn::Token![=]>()?;
    let value = input.parse::<T>()?;
    input.parse::<syn::Token![,]>()?;
    Ok(value)
}

impl syn::parse::Parse for ToolDefinition {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let name = parse_named_assignment::<syn::LitStr>(input, "name")?;
        let description = parse_named_assignment::<syn::LitStr>(input, "description")?;
        let params_type = parse_named_assignment::<syn::Type>(input, "params")?;
        let execute_body: syn::ExprClosure = input.parse()?;
        // allow a trailing comma after the closure
        let _ = input.parse::<Option<syn::Token![,]>>()?;

        Ok(ToolDefinition {
            name,
            description,
            params_type,
            execute_body,
        })
    }
}

/// Implements `travel_agenta::schema::CompletionSchema` for a named struct.
///
/// Accepts optional `name = "..."` and `description = "..."` arguments; the
/// description falls back to the struct's doc comment.
#[proc_macro_attribute]
pub fn completion_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    completion_schema::completion_schema(attr, item)
}

#[cfg(test)]
mod tests {
    use super::pascal_case;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("budget_calculator"), "BudgetCalculator");
        assert_eq!(pascal_case("send__email_"), "SendEmail");
        assert_eq!(pascal_case("weather"), "Weather");
    }
}
