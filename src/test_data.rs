#[cfg(test)]
pub const POST_MD: &str = "# Writing a tiny database

## March 5, 2023

### Storage engines from scratch

###### databases, go

Let's build a key-value store.

#### Aside

This is a side note.

## The log

Every write is appended first:

```go
func (db *DB) Put(key, value string) error {
\treturn db.log.Append(key, value)
}
```

### Compaction

Old segments get merged.

#### Notes

Nothing else.
";

#[cfg(test)]
pub const DRAFT_MD: &str = "# Half-baked idea

## January 10, 2022

###### go, draft

Not ready yet.
";

#[cfg(test)]
pub const OLDER_MD: &str = "# Learning Go

## December 25, 2021

###### go, external

Some thoughts on Go.
";

#[cfg(test)]
pub const PAGE_MD: &str = "Books I recommend:

- Designing Data-Intensive Applications
- Database Internals
";

#[cfg(test)]
pub const TEMPLATE: &str = "<html>
<head><title>{{{tag}}}</title>{{{meta}}}<link rel=\"canonical\" href=\"{{full_url}}\" /></head>
<body class=\"{{hide_on_index}}\">
<h1>{{{title}}}</h1>
<div class=\"subtitle\">{{{subtitle}}}</div>
{{{real_subtitle}}}
{{{tags}}}
<main>{{{post}}}</main>
<aside>{{{frequent_tags}}}</aside>
{{{mail}}}
</body>
</html>
";

#[cfg(test)]
pub const MAIL_SNIPPET: &str = "<form class=\"signup\">Subscribe</form>";
