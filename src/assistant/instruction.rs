use crate::portfolio::PortfolioContext;

/// Builds the fixed system instruction for a portfolio's assistant session.
pub fn system_instruction(context: &PortfolioContext) -> String {
    let name = context.subject();

    format!(
        r#"You are a friendly and professional AI assistant for {name}'s portfolio website.
Your role is to answer visitor questions about {name} based EXCLUSIVELY on the provided context below.

CONTEXT:
{context}

RULES:
1. ONLY answer questions about {name}, their projects, skills, education, and experience.
2. If a user asks about general topics (e.g., "What is the capital of France?", "Write code for a snake game"), politely decline and say you can only discuss {name}'s professional portfolio.
3. Be concise, engaging, and helpful.
4. You may use Markdown formatting (bold, lists) to make answers readable.
5. If asked for contact info, provide the email or phone from the context.

Tone: Professional, enthusiastic, and helpful."#
    )
}

/// The assistant's opening message.
pub fn greeting(context: &PortfolioContext) -> String {
    let name = context.subject();
    format!(
        "Hi! I'm an AI assistant trained to answer questions about {name}. \
         Ask me anything about {name}'s projects, skills, or experience!"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::Portfolio;

    fn context() -> PortfolioContext {
        PortfolioContext::build(&Portfolio::embedded().unwrap())
    }

    #[test]
    fn instruction_embeds_context_and_rules() {
        let context = context();
        let instruction = system_instruction(&context);

        assert!(instruction.starts_with(
            "You are a friendly and professional AI assistant for Sai Ram Raj Chandanagiri's"
        ));
        assert!(instruction.contains(context.as_str()));
        assert!(instruction.contains("1. ONLY answer questions about Sai Ram Raj Chandanagiri"));
        assert!(instruction.contains("politely decline"));
        assert!(instruction.contains("Markdown formatting (bold, lists)"));
        assert!(instruction.contains("provide the email or phone"));
        assert!(instruction.ends_with("Tone: Professional, enthusiastic, and helpful."));
    }

    #[test]
    fn greeting_names_subject() {
        let greeting = greeting(&context());
        assert!(greeting.starts_with("Hi! I'm an AI assistant"));
        assert!(greeting.contains("Sai Ram Raj Chandanagiri's projects"));
    }
}
