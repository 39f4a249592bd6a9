//! Prompts for the oracle-guided memory rounds
//!
//! Each round declares its own tagged block and the prompts are shared
//! between whatever oracle backs the session. Placeholders are brace
//! tokens replaced verbatim.

/// System instruction supplied on every oracle call.
pub const SYSTEM_INSTRUCTION: &str =
    "You are Sam, a helpful friend who wants the best for the current user.";

/// Retrieval round 1: pick relevant top-level domains.
///
/// Placeholders: {query} - contextualized query; {domains} - registered domain names
pub const DOMAIN_SELECT_PROMPT: &str = r#"Here is the conversation context and the latest query:
{query}

Here are the top level domains in my knowledge base:
{domains}

Select only the domains relevant to this query and return them in this format:
<keys>
domain_name
...one per line
</keys>
1. Do not generate any text outside the <keys> block
2. Only return domain names from the list above"#;

/// Retrieval round 2: pick subfields worth recalling per domain.
///
/// Placeholders: {query}; {catalog} - lines of `domain | subfield, subfield, ...`
pub const SUBFIELD_SELECT_PROMPT: &str = r#"Here is the conversation context and the latest query:
{query}

I've chosen some domains from my knowledge base. For each one, select the
subfields worth retrieving for this query. Retrieve less for generic turns
and more for specific ones. Here is each domain with its subfields:
{catalog}

Return your output in the format:
<keys>
domain_name | chosen_subfield, chosen_subfield, ...
...one line per domain
</keys>
DO NOT OUTPUT ANY TEXT OUTSIDE <keys>...</keys>"#;

/// Ingestion round 1: extract new domains and raw facts.
///
/// Placeholders: {query} - conversation summary plus latest interaction;
/// {domains} - registered domain names; {recalled} - already-known facts
pub const EXTRACT_PROMPT: &str = r#"The user's last query and the conversation so far:
{query}

Retrieved context, stuff we already know (do not re-learn any of it):
{recalled}

Top level knowledge domains:
{domains}

Figure out what, if any, NEW information is contained in the user's query.
Err on the side of including MORE. Also figure out if we need new top level
domains. Then output this information in this format:
<new>
new_domain_name | one-line general description
...one per line, only if new domains are required
</new>
<fact>
existing_or_new_domain_name | the new fact as one line
...one per line
</fact>
Either block may be left empty when there is nothing to report."#;

/// Ingestion round 2: plan the merge for one domain's pending facts.
///
/// Placeholders: {domain}; {subfields} - existing subfield names;
/// {facts} - pending fact lines
pub const MERGE_PROMPT: &str = r#"Here are the existing subfields of the domain "{domain}":
{subfields}

The new facts we want to fold in:
{facts}

For each change you are confident about, return one line:
Add/Alter | subfield_name | "fact text"

Use Add to create or extend a subfield, Alter to replace its contents.
Write fact text that stands alone later: no unresolved references like
"today" or "that day". Return all output within <ans>...</ans> tags,
NO EXTRA TEXT.
e.g.
<ans>
Add | sister | "Aadya, 5 years younger"
</ans>
This example will associate the "sister" subfield with "Aadya, 5 years younger"."#;

/// Context compression: distill the latest turn against the running context.
///
/// Placeholders: {context} - rendered window so far; {turn} - raw turn text
pub const COMPRESS_PROMPT: &str = r#"Context up till now:
{context}

Using this, extract all useful information from the newest message below.
Be thorough but concise; do not skip anything useful. If the message says
nothing worth keeping, return an empty block.
Newest message:
{turn}

Return the result in this format:
<context>
...
</context>
Do not return any text outside the <context> block."#;
