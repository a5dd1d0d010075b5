//! Built-in starter documents

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub html: &'static str,
}

const CONTRACT: &str = r#"<h1>LEGAL CONTRACT</h1>
<p><strong>THIS AGREEMENT</strong> is made on [DATE] between:</p>
<p><strong>[PARTY A NAME]</strong> of [ADDRESS] ("the First Party")</p>
<p>and</p>
<p><strong>[PARTY B NAME]</strong> of [ADDRESS] ("the Second Party")</p>
<h2>1. DEFINITIONS</h2>
<p>In this Agreement, unless the context otherwise requires:</p>
<ul>
<li>"Effective Date" means the date of this Agreement;</li>
<li>"Term" means the period from the Effective Date until termination;</li>
</ul>
<h2>2. SCOPE OF WORK</h2>
<p>The Second Party shall provide the following services:</p>
<ul>
<li>Service 1</li>
<li>Service 2</li>
</ul>
<h2>3. PAYMENT TERMS</h2>
<p>Payment shall be made as follows:</p>
<p>Amount: [AMOUNT]</p>
<p>Due Date: [DATE]</p>
<h2>4. TERMINATION</h2>
<p>Either party may terminate this Agreement with [NOTICE PERIOD] written notice.</p>
<h2>5. GOVERNING LAW</h2>
<p>This Agreement shall be governed by the laws of [JURISDICTION].</p>
<p><strong>SIGNED:</strong></p>
<p>First Party: _________________ Date: ___________</p>
<p>Second Party: _________________ Date: ___________</p>"#;

const LETTER: &str = r#"<p>[DATE]</p>
<p>[RECIPIENT NAME]<br/>
[RECIPIENT ADDRESS]</p>
<p><strong>Subject: [SUBJECT]</strong></p>
<p>Dear [RECIPIENT NAME],</p>
<p>I am writing to you regarding [SUBJECT MATTER].</p>
<p>[BODY OF LETTER]</p>
<p>Please contact me if you have any questions.</p>
<p>Sincerely,<br/>
[YOUR NAME]<br/>
[YOUR TITLE]<br/>
[YOUR CONTACT INFORMATION]</p>"#;

const AGREEMENT: &str = r#"<h1>SERVICE AGREEMENT</h1>
<p><strong>AGREEMENT</strong> made on [DATE] between:</p>
<p><strong>[SERVICE PROVIDER]</strong> ("Provider")</p>
<p>and</p>
<p><strong>[CLIENT]</strong> ("Client")</p>
<h2>1. SERVICES</h2>
<p>The Provider shall provide the following services:</p>
<ul>
<li>Service description 1</li>
<li>Service description 2</li>
</ul>
<h2>2. COMPENSATION</h2>
<p>Client shall pay Provider [AMOUNT] for services rendered.</p>
<h2>3. TERM</h2>
<p>This agreement shall commence on [START DATE] and continue until [END DATE].</p>
<h2>4. CONFIDENTIALITY</h2>
<p>Both parties agree to maintain confidentiality of all information shared.</p>
<p><strong>SIGNED:</strong></p>
<p>Provider: _________________ Date: ___________</p>
<p>Client: _________________ Date: ___________</p>"#;

const NOTICE: &str = r#"<h1>LEGAL NOTICE</h1>
<p><strong>TO:</strong> [RECIPIENT NAME]<br/>
<strong>FROM:</strong> [SENDER NAME]<br/>
<strong>DATE:</strong> [DATE]<br/>
<strong>SUBJECT:</strong> [SUBJECT]</p>
<p>This notice is given pursuant to [RELEVANT LAW/REGULATION].</p>
<p><strong>NOTICE:</strong></p>
<p>[DETAILED NOTICE CONTENT]</p>
<p><strong>ACTION REQUIRED:</strong></p>
<p>[SPECIFIC ACTION REQUIRED]</p>
<p><strong>DEADLINE:</strong> [DEADLINE DATE]</p>
<p>If you fail to comply with this notice, legal action may be taken.</p>
<p>Sincerely,<br/>
[SENDER NAME]<br/>
[SENDER CONTACT INFORMATION]</p>"#;

static TEMPLATES: [Template; 4] = [
    Template {
        id: "contract",
        name: "Legal Contract",
        description: "Standard legal contract template with clauses and terms",
        category: "Legal",
        html: CONTRACT,
    },
    Template {
        id: "letter",
        name: "Legal Letter",
        description: "Professional legal letter template",
        category: "Legal",
        html: LETTER,
    },
    Template {
        id: "agreement",
        name: "Service Agreement",
        description: "Service agreement template for business relationships",
        category: "Business",
        html: AGREEMENT,
    },
    Template {
        id: "notice",
        name: "Legal Notice",
        description: "Legal notice template for formal communications",
        category: "Legal",
        html: NOTICE,
    },
];

pub fn all() -> &'static [Template] {
    &TEMPLATES
}

pub fn find(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_find() {
        assert_eq!(find("letter").map(|t| t.name), Some("Legal Letter"));
        assert!(find("will").is_none());
        assert_eq!(all().len(), 4);
    }

    #[test]
    fn test_templates_parse() {
        for template in all() {
            let doc = Document::from_html(template.html);
            assert!(!doc.is_empty(), "{} parsed empty", template.id);
            assert_eq!(doc.page_break_count(), 0);
        }
        let contract = Document::from_html(CONTRACT);
        assert!(contract.plain_text().contains("GOVERNING LAW"));
    }
}
